//! `SeaORM` entity definitions.

pub mod claims;

pub mod prelude {
    //! Entity re-exports.
    pub use super::claims::Entity as Claims;
}
