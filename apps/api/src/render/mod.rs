// The document renderer: turns a `CvModel` into a paginated PDF byte stream.

pub mod elements;
pub mod fonts;
pub mod stream;
pub mod theme;

mod document;

pub use document::Renderer;
