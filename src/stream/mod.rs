//! Stream resolution for film player pages.
//!
//! A player page is scanned by an ordered set of extraction strategies
//! (explicit source tags, embedded player configuration, URL patterns,
//! attribute heuristics); their candidates are merged, deduplicated and
//! ranked by confidence.

pub mod candidate;
pub mod diagnostic;
pub mod page;
pub mod player;
pub mod resolver;
pub mod strategy;

pub use candidate::{Confidence, StreamCandidate, StreamFormat};
pub use diagnostic::Diagnostic;
pub use page::{Node, PageDocument};
pub use player::unwrap_player_response;
pub use resolver::{Resolution, StreamResolver};
pub use strategy::ExtractionStrategy;
