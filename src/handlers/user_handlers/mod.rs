pub mod crud;
pub mod list;

pub use self::crud::{create, delete, new_form, update};
pub use self::list::list;
