pub mod peer;
pub mod resolver;
pub mod source;

pub use peer::peer_authority;
pub use resolver::resolve_conflicts;
pub use source::HttpChainSource;
