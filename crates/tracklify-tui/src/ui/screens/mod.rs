mod device_select;
mod live_feed;

pub use device_select::DeviceSelectScreen;
pub use live_feed::LiveFeedScreen;
