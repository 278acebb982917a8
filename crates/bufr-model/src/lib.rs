pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod section1;
pub mod subset;
pub mod template;
pub mod value;

pub use dataset::Dataset;
pub use descriptor::{Descriptor, DescriptorKind};
pub use error::{ModelError, Result};
pub use section1::Section1;
pub use subset::{DataField, DataSubset};
pub use template::Template;
pub use value::Value;
