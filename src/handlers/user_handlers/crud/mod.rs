pub mod helpers;
pub mod create;
pub mod update;
pub mod delete;

pub use self::create::{new_form, create};
pub use self::update::update;
pub use self::delete::delete;
