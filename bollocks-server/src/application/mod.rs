pub(crate) mod engagement_service;
pub(crate) mod post_store;
pub(crate) mod profile_service;
pub(crate) mod tag_deriver;
