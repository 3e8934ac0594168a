pub mod draft;
pub mod media;
pub mod preview;
pub mod record;
pub mod records;
pub mod variant;

pub use draft::*;
pub use media::*;
pub use preview::*;
pub use record::*;
pub use records::*;
pub use variant::*;
