use iced::Event;

use crate::config::types::Config;
use crate::device::types::{DeviceEvent, PairedDevice};

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ApplyDirtyConfig,
    ConfigLoadComplete((Config, Option<String>)),
    ConfigSaveComplete(Option<String>), // error message if the save failed
    DeviceCommandSent(bool), // false if the connection task is gone
    NoticeConfirmed,
    DeviceEvent(DeviceEvent),
    ScanPress,
    ResetPress,
    AddRadiusPress,
    DevicePress(PairedDevice),
    RadiusEditPress,
    RadiusInput(String),
    RadiusSavePress,
}
