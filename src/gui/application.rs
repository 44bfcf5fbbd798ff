use futures::channel::mpsc::Sender;
use futures::SinkExt;
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::alignment::Horizontal;
use iced::event::{self, Event};
use iced::executor;
use iced::time::{every as iced_time_every};
use iced::theme::{self, Theme};
use iced::widget::{
    Column, button, column, container, horizontal_rule, row, scrollable, text, text_input,
};
use iced::window::icon;
use std::time::Duration;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::connection::connect_device_subscription;
use crate::device::types::{DeviceCommand, DeviceEvent, PairedDevice};
use crate::error::AppRunError;
use crate::gui::style::{CardStyleSheet, TextButtonStyleSheet, DISTANCE_CARD_COLOR, RADIUS_CARD_COLOR};
use crate::gui::types::Message;
use crate::measurement::format_radius;
use crate::state::MeterState;

/// Settings given on the command line. They override the config file for this run only.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub port: Option<String>,
    pub device_name: Option<String>,
    pub baud_rate: Option<u32>,
    pub show_all_ports: bool,
}

impl StartupOptions {
    fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(device_name) = &self.device_name {
            config.device_name = device_name.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            config.baud_rate = baud_rate;
        }
        config.show_all_ports |= self.show_all_ports;
        config.sanitize();
        config
    }
}

pub struct ApplicationFlags {
    config_io: ConfigIO,
    startup: StartupOptions,
}

pub struct DistanceMeterApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    // current config, might not be saved to disk yet
    config_io: ConfigIO,
    config: Config,
    config_loaded: bool,
    config_dirty: bool,
    // this flag is used to make sure that a user is not spammed with save configuration errors
    displayed_config_save_error: bool,

    startup: StartupOptions,
    startup_done: bool,

    // commands for the device connection task, available once it is running
    device_sender: Option<Sender<DeviceCommand>>,

    meter: MeterState,
}

impl DistanceMeterApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    let mut error_message: Option<String> = None;

                    if err.is_file_not_found_error() {
                        // this is probably the first start of the app
                        info!("Config file not found, using defaults");
                    } else {
                        error!("Failed to load config: {:?}", &err);
                        error_message = Some(format!("Failed to load config: {}", &err));
                    }
                    (Config::default(), error_message)
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn save_config(&self) -> Command<Message> {
        let config = self.config.clone();
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.save(config).await {
                Ok(_) => None,
                Err(err) => {
                    error!("Failed to save config: {:?}", &err);
                    Some(format!("Failed to save config: {}", &err))
                },
            }
        };

        Command::perform(fut, Message::ConfigSaveComplete)
    }

    fn send_device_command(&self, command: Option<DeviceCommand>) -> Command<Message> {
        let Some(command) = command else {
            return Command::none();
        };

        let Some(mut sender) = self.device_sender.clone() else {
            warn!("Device connection is not running yet, dropping {:?}", command);
            return Command::none();
        };

        let fut = async move {
            match sender.send(command).await {
                Ok(_) => true,
                Err(err) => {
                    error!("Failed to send command to device connection: {:?}", err);
                    false
                },
            }
        };

        Command::perform(fut, Message::DeviceCommandSent)
    }

    // connect to the port given on the command line once both the config and the device
    // connection task are ready
    fn maybe_start(&mut self) -> Command<Message> {
        if self.startup_done || !self.config_loaded || self.device_sender.is_none() {
            return Command::none();
        }
        self.startup_done = true;

        match self.startup.port.clone() {
            Some(port) => {
                let command = self.meter.connect(PairedDevice::from_port_name(&port));
                self.send_device_command(Some(command))
            },
            None => Command::none(),
        }
    }

    // persist the wheel radius whenever it changed, by the user or by the device
    fn track_radius(&mut self) {
        let radius = self.meter.wheel_radius_mm();
        if self.config_loaded && self.config.wheel_radius_mm != radius {
            self.config.wheel_radius_mm = radius;
            self.config_dirty = true;
        }
    }

    fn handle_device_event(&mut self, event: DeviceEvent) -> Command<Message> {
        match event {
            DeviceEvent::Ready(sender) => {
                info!("Device connection ready");
                self.device_sender = Some(sender);
                return self.maybe_start();
            },
            DeviceEvent::Scanned(devices) => {
                let command = self.meter.devices_scanned(devices);
                return self.send_device_command(command);
            },
            DeviceEvent::ScanFailed(error) => self.meter.scan_failed(error),
            DeviceEvent::StateChange(state) => self.meter.device_state_changed(state),
            DeviceEvent::Reply(reply) => self.meter.apply_reply(reply),
            DeviceEvent::Sent(command) => info!("Sent {} to device", command),
            DeviceEvent::WriteFailed(error) => self.meter.write_failed(error),
        }

        Command::none()
    }

    fn radius_section(&self) -> Element<Message> {
        let radius = format_radius(self.meter.wheel_radius_mm());

        let editor: Element<Message> = match self.meter.radius_input() {
            Some(input) => row![
                text_input("Radius (mm)", input)
                    .on_input(Message::RadiusInput)
                    .on_submit(Message::RadiusSavePress)
                    .width(Length::Fill),
                button(text("Save")).on_press(Message::RadiusSavePress),
            ]
                .align_items(Alignment::Center)
                .spacing(8)
                .into(),
            None => row![
                text(format!("{} mm", radius)).size(18).width(Length::Fill),
                button(text("Edit")).on_press(Message::RadiusEditPress),
            ]
                .align_items(Alignment::Center)
                .spacing(8)
                .into(),
        };

        container(
            column![
                text("Wheel radius").size(18),
                editor,
            ]
                .align_items(Alignment::Center)
                .spacing(8),
        )
            .style(theme::Container::Custom(Box::new(CardStyleSheet { background: RADIUS_CARD_COLOR })))
            .width(Length::Fill)
            .padding(16)
            .into()
    }

    fn distance_section(&self) -> Element<Message> {
        let display = self.meter.distance_display();

        container(
            column![
                text("Measured distance").size(20),
                row![
                    text(&display.value).size(56),
                    text(display.unit.to_string()).size(24),
                ]
                    .align_items(Alignment::End)
                    .spacing(8),
            ]
                .align_items(Alignment::Center)
                .spacing(16),
        )
            .style(theme::Container::Custom(Box::new(CardStyleSheet { background: DISTANCE_CARD_COLOR })))
            .width(Length::Fill)
            .center_x()
            .padding(24)
            .into()
    }

    fn device_list(&self) -> Element<Message> {
        let entries = self.meter.devices()
            .iter()
            .map(|device| {
                button(
                    column![
                        text(&device.name).size(16),
                        text(&device.port_name).size(12),
                    ].spacing(2)
                )
                    .style(theme::Button::Custom(Box::new(TextButtonStyleSheet)))
                    .width(Length::Fill)
                    .on_press(Message::DevicePress(device.clone()))
            })
            .map(Element::from);

        scrollable(Column::with_children(entries).spacing(4).width(Length::Fill))
            .height(Length::Fill)
            .into()
    }
}

impl Application for DistanceMeterApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (DistanceMeterApplication, Command<Self::Message>) {
        let config = Config::default();

        let app = DistanceMeterApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            meter: MeterState::new(&flags.startup.apply(&config)),
            config,
            config_loaded: false,
            config_dirty: false,
            displayed_config_save_error: false,
            startup: flags.startup,
            startup_done: false,
            device_sender: None,
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("Distance Meter ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        let command = match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                self.meter.apply_config(&self.startup.apply(&config));
                self.config = config;
                self.config_loaded = true;
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
                self.maybe_start()
            },
            Message::ApplyDirtyConfig => {
                if self.config_dirty {
                    self.config_dirty = false;
                    self.save_config()
                } else {
                    Command::none()
                }
            },
            Message::ConfigSaveComplete(error_message) => {
                if !self.displayed_config_save_error {
                    if let Some(error_message) = error_message {
                        self.displayed_config_save_error = true;
                        self.notices.push(error_message);
                    }
                }
                Command::none()
            },
            Message::DeviceCommandSent(delivered) => {
                if !delivered {
                    self.device_sender = None;
                    self.notices.push("The device connection stopped unexpectedly".to_string());
                }
                Command::none()
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
                Command::none()
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                window::close(id)
            },
            Message::EventOccurred(_) => Command::none(),
            Message::DeviceEvent(event) => self.handle_device_event(event),
            Message::ScanPress => {
                let command = self.meter.scan();
                self.send_device_command(Some(command))
            },
            Message::DevicePress(device) => {
                let command = self.meter.connect(device);
                self.send_device_command(Some(command))
            },
            Message::ResetPress => {
                let command = self.meter.reset();
                self.send_device_command(command)
            },
            Message::AddRadiusPress => {
                let command = self.meter.add_radius();
                self.send_device_command(command)
            },
            Message::RadiusEditPress => {
                self.meter.begin_radius_edit();
                Command::none()
            },
            Message::RadiusInput(value) => {
                self.meter.radius_input_changed(value);
                Command::none()
            },
            Message::RadiusSavePress => {
                let command = self.meter.save_radius_edit();
                self.send_device_command(command)
            },
        };

        self.track_radius();
        command
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            iced_time_every(Duration::from_secs(1)).map(|_| Message::ApplyDirtyConfig),
            connect_device_subscription(self.app_cancel.clone()).map(Message::DeviceEvent),
        ])
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let add_radius_label = format!("Add radius (+ {} mm)", format_radius(self.meter.wheel_radius_mm()));

        container(
            column![
                text("Distance Meter").size(32),

                self.radius_section(),

                self.distance_section(),

                text(self.meter.status())
                    .width(Length::Fill)
                    .horizontal_alignment(Horizontal::Center),

                row![
                    button(text("Bluetooth").horizontal_alignment(Horizontal::Center))
                        .width(Length::FillPortion(5))
                        .on_press(Message::ScanPress),
                    button(text("Reset").horizontal_alignment(Horizontal::Center))
                        .width(Length::FillPortion(3))
                        .on_press(Message::ResetPress),
                ].spacing(8),

                button(text(add_radius_label).horizontal_alignment(Horizontal::Center))
                    .width(Length::Fill)
                    .on_press(Message::AddRadiusPress),

                horizontal_rule(10),

                text("Paired devices").size(18).width(Length::Fill),

                self.device_list(),
            ]
                .spacing(16)
                .align_items(Alignment::Center)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .padding(24)
        .into()
    }
}

fn make_icon() -> Option<icon::Icon> {
    let bytes = include_bytes!(concat!(env!("OUT_DIR"), "/icon-32-rgba"));

    match icon::from_rgba(bytes.to_vec(), 32, 32) {
        Ok(icon) => Some(icon),
        Err(err) => {
            warn!("Failed to load window icon: {}", err);
            None
        },
    }
}

pub fn run_application(startup: StartupOptions) -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io, startup };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("distance-meter".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(420.0, 760.0);
    settings.window.icon = make_icon();

    // this function will call process::exit() unless there was a startup error
    DistanceMeterApplication::run(settings)?;
    Ok(())
}
