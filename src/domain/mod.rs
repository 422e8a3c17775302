pub mod item;
pub mod tags;

pub use item::{ImageDescriptor, Item, ItemKind};
pub use tags::TagExpression;
