//! Typed backend resources.
//!
//! Response shapes are validated at the transport boundary. Unknown roles
//! fall back to an ordinary user, optional fields are `Option`, and anything
//! else that does not match fails to decode instead of being trusted.

pub mod admin;
pub mod community;
pub mod order;
pub mod principal;
pub mod product;
pub mod upload;

pub use admin::DashboardStats;
pub use community::{BlogPost, CommunityEvent, NewComment, NewEvent, NewPost};
pub use order::{Order, OrderCustomer, OrderItem, PlacedOrder, ShippingAddress};
pub use principal::{Principal, PrincipalPatch};
pub use product::{NewReview, Product, ProductDraft, ProductPage, ProductQuery, Review};
pub use upload::Upload;
