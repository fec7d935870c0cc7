pub mod queries;

pub use queries::{nationality_slug, GroupCount, ListingRequest, Population, Profile, RegistryQueries, TitleHolder};
