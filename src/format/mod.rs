//! Message formatting stages around the markup parser.

pub mod attachments;
pub mod normalize;
pub mod render;
pub mod resolver;
pub mod reverse;

pub use attachments::AttachmentFlattener;
pub use normalize::Normalizer;
pub use render::{RenderedBodies, RichTextRenderer};
pub use resolver::{EntityResolver, ResolvedEntities, ResolvedEntity};
pub use reverse::ReverseTranslator;
