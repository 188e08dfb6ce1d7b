pub mod rate;

pub use rate::Entity as Rate;
