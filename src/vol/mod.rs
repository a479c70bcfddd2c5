pub mod heston_bates;
pub mod surface;

pub use heston_bates::{bates_call_price, BatesParams};
pub use surface::{generate_surface, implied_vol, dupire_local_vol, LocalVolSurface, PricingModel, SurfaceGrid};
