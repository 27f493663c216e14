mod cache;
mod detail;
mod feed;
mod login;
mod planner;
mod share;

pub use cache::CacheStatusView;
pub use detail::ResponseDetailView;
pub use feed::FeedView;
pub use login::LoginView;
pub use planner::PlannerView;
pub use share::ShareView;
