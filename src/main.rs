// src/main.rs
//
// TDS water-quality monitor: desktop front-end.
//
// The acquisition state machine lives in the library (`tds_monitor::Monitor`);
// this file only maps buttons to commands, turns status updates into labels
// and keeps the poll timer subscription keyed to the outstanding ticket.

mod chart;

use std::path::{Path, PathBuf};
use std::time::Duration;

use iced::time;
use iced::widget::{button, column, pick_list, row, text};
use iced::{window, Alignment, Color, Element, Length, Size, Subscription, Task};
use plotters_iced::ChartWidget;
use rfd::FileDialog;

use tds_monitor::{
    DestinationChooser, Monitor, PollTicket, PortEntry, Presenter, Sample, SerialConnector,
    Settings, Severity, Status, Verdict,
};

use crate::chart::TdsChart;

const BAUD_OPTIONS: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

// ---------------- UI Messages ----------------

#[derive(Debug, Clone)]
pub enum Message {
    Connect,
    Disconnect,
    ToggleLogging,
    ExportCsv,
    ResetChart,
    Exit,
    Poll(PollTicket),
    RefreshPorts,
    PortSelected(PortEntry),
    BaudRateSelected(u32),
}

// ---------------- Screen state (Presenter) ----------------

const GRAY: Color = Color::from_rgb(0.47, 0.47, 0.47);
const GREEN: Color = Color::from_rgb(0.0, 0.59, 0.0);
const RED: Color = Color::from_rgb(0.85, 0.33, 0.31);
const ORANGE: Color = Color::from_rgb(0.9, 0.55, 0.0);
const SAFE_GREEN: Color = Color::from_rgb(0.36, 0.72, 0.36);
const NAVY: Color = Color::from_rgb(0.08, 0.21, 0.33);

/// Everything the window shows, updated only through `Presenter`.
struct Screen {
    status: (String, Color),
    current: Option<Sample>,
    verdict: Option<Verdict>,
    snapshot: Vec<Sample>,
    threshold: f64,
    idle_headline: (String, Color),
    error: Option<String>,
}

impl Screen {
    fn new(snapshot: Vec<Sample>, threshold: f64) -> Self {
        Self {
            status: ("Waiting for connection...".to_string(), Color::BLACK),
            current: None,
            verdict: None,
            snapshot,
            threshold,
            idle_headline: (format!("Alert threshold: {threshold} ppm"), Color::BLACK),
            error: None,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Presenter for Screen {
    fn reading(&mut self, snapshot: &[Sample], sample: Sample, verdict: &Verdict) {
        self.snapshot = snapshot.to_vec();
        self.current = Some(sample);
        self.verdict = Some(*verdict);
    }

    fn status(&mut self, status: Status) {
        match status {
            Status::Connected { port, baud_rate } => {
                self.error = None;
                self.status = (format!("Connected to {port} @ {baud_rate}"), GREEN);
            }
            Status::ConnectFailed { port, reason } => {
                self.status = (
                    format!("Error: could not connect to {port}. Check the cable and the port."),
                    RED,
                );
                self.error = Some(reason);
            }
            Status::Disconnected => self.status = ("Disconnected".to_string(), ORANGE),
            Status::ConnectionLost { reason } => {
                self.status = ("Connection lost".to_string(), RED);
                self.error = Some(reason);
            }
            Status::LoggingStarted(path) => {
                self.status = (format!("Log started: {}", file_name(&path)), NAVY);
            }
            Status::LoggingStopped(_) => self.status = ("Log stopped.".to_string(), GRAY),
            Status::LoggingRefused => {
                self.error = Some("Connect to the sensor before starting the log.".to_string());
            }
            Status::LoggingFailed(e) => self.error = Some(format!("Failed to start log: {e}")),
            Status::LogWriteFailed(e) => self.error = Some(format!("Log write failed: {e}")),
            Status::BufferReset => {
                self.snapshot = vec![Sample::ZERO; self.snapshot.len()];
                self.current = None;
                self.verdict = None;
                self.idle_headline = ("Waiting for data...".to_string(), GRAY);
            }
            Status::Exported(path) => {
                self.status = (format!("Buffer saved to {}", file_name(&path)), NAVY);
            }
            Status::ExportFailed(e) => self.error = Some(format!("Failed to save file: {e}")),
        }
    }
}

// ---------------- File dialogs ----------------

struct DialogChooser {
    dir: PathBuf,
}

impl DestinationChooser for DialogChooser {
    fn log_destination(&mut self, suggested_name: &str) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Text log", &["txt"])
            .add_filter("All files", &["*"])
            .set_directory(&self.dir)
            .set_file_name(suggested_name)
            .save_file()
    }

    fn export_destination(&mut self, suggested_name: &str) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_directory(&self.dir)
            .set_file_name(suggested_name)
            .save_file()
    }
}

// ---------------- App ----------------

struct TdsMonitorApp {
    monitor: Monitor<SerialConnector>,
    screen: Screen,
    chooser: DialogChooser,

    settings: Settings,
    settings_path: PathBuf,

    available_ports: Vec<PortEntry>,
    selected_port: Option<PortEntry>,
}

impl Default for TdsMonitorApp {
    fn default() -> Self {
        let settings_path = Settings::default_path();
        let settings = Settings::load_or_default(&settings_path);

        let monitor = Monitor::new(SerialConnector, &settings);
        let screen = Screen::new(monitor.buffer().snapshot(), monitor.threshold());

        let dir = Settings::app_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::warn!("could not create {}: {e}", dir.display());
        }

        let mut app = Self {
            monitor,
            screen,
            chooser: DialogChooser { dir },
            settings,
            settings_path,
            available_ports: Vec::new(),
            selected_port: None,
        };
        app.refresh_ports();
        app
    }
}

impl TdsMonitorApp {
    fn title(&self) -> String {
        "TDS Water Quality Monitor".to_string()
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            log::warn!("settings save: {e}");
        }
    }

    fn refresh_ports(&mut self) {
        self.available_ports = tds_monitor::device::scan_ports();
        self.selected_port = self
            .available_ports
            .iter()
            .find(|p| p.port_name.eq_ignore_ascii_case(&self.settings.port_name))
            .cloned();
    }

    /// Port settings are locked while a connection is open.
    fn apply_port_settings(&mut self) {
        if self.monitor.set_port_config(self.settings.port_config()) {
            self.persist_settings();
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Connect => {
                self.screen.error = None;
                self.monitor.connect(&mut self.screen);
                self.persist_settings();
            }

            Message::Disconnect => {
                self.monitor.disconnect(&mut self.screen);
                self.persist_settings();
            }

            Message::ToggleLogging => {
                self.screen.error = None;
                self.monitor
                    .toggle_logging(&mut self.chooser, &mut self.screen);
            }

            Message::ExportCsv => {
                self.monitor
                    .export_snapshot(&mut self.chooser, &mut self.screen);
            }

            Message::ResetChart => self.monitor.reset_buffer(&mut self.screen),

            Message::Exit => {
                self.monitor.exit(&mut self.screen);
                self.persist_settings();
                return iced::exit::<Message>();
            }

            Message::Poll(ticket) => self.monitor.poll(ticket, &mut self.screen),

            Message::RefreshPorts => self.refresh_ports(),

            Message::PortSelected(p) => {
                if self.monitor.is_connected() {
                    return Task::none();
                }
                self.settings.port_name = p.port_name.clone();
                self.selected_port = Some(p);
                self.apply_port_settings();
            }

            Message::BaudRateSelected(baud) => {
                if self.monitor.is_connected() {
                    return Task::none();
                }
                self.settings.baud_rate = baud;
                self.apply_port_settings();
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        fn action_button<'a>(
            label: &'a str,
            enabled: bool,
            msg: Message,
        ) -> iced::widget::Button<'a, Message> {
            let mut b = button(label);
            if enabled {
                b = b.on_press(msg);
            }
            b
        }

        let connected = self.monitor.is_connected();
        let logging = self.monitor.is_logging();

        let port_widget: Element<'_, Message> = if connected {
            text(
                self.selected_port
                    .as_ref()
                    .map(|p| p.display.as_str())
                    .unwrap_or(&self.settings.port_name),
            )
            .into()
        } else {
            pick_list(
                self.available_ports.clone(),
                self.selected_port.clone(),
                Message::PortSelected,
            )
            .placeholder(self.settings.port_name.clone())
            .width(Length::Fixed(360.0))
            .into()
        };

        let baud_widget: Element<'_, Message> = if connected {
            text(format!("{}", self.settings.baud_rate)).into()
        } else {
            pick_list(
                BAUD_OPTIONS,
                Some(self.settings.baud_rate),
                Message::BaudRateSelected,
            )
            .width(Length::Fixed(120.0))
            .into()
        };

        let log_label = if logging { "Stop Log (active)" } else { "Start Log" };

        let controls = row![
            action_button("Connect", true, Message::Connect),
            action_button("Disconnect", connected, Message::Disconnect),
            action_button(log_label, true, Message::ToggleLogging),
            button("Save Buffer CSV").on_press(Message::ExportCsv),
            button("Reset Chart").on_press(Message::ResetChart),
            button("Exit").on_press(Message::Exit),
        ]
        .spacing(10);

        let (status_text, status_color) = &self.screen.status;

        let current_text = match self.screen.current {
            Some(s) => format!("Current TDS: {:.2} ppm", s.ppm()),
            None => "Current TDS: -- ppm".to_string(),
        };

        let (headline, headline_color) = match &self.screen.verdict {
            Some(v) => match v.severity() {
                Severity::Alert => (v.headline(), RED),
                Severity::Normal => (v.headline(), SAFE_GREEN),
            },
            None => self.screen.idle_headline.clone(),
        };

        let chart = TdsChart {
            points: &self.screen.snapshot,
            max_ppm: self.monitor.buffer().max_ppm(),
            threshold: self.screen.threshold,
        };
        let plot: Element<Message> = ChartWidget::new(chart)
            .width(Length::Fill)
            .height(Length::Fill)
            .into();

        let mut content = column![
            row![text("Port:"), port_widget, text("Baud:"), baud_widget]
                .spacing(10)
                .align_y(Alignment::Center),
            controls,
            text(status_text.clone()).color(*status_color),
            text(current_text).size(28.0).color(NAVY),
            text(headline).size(20.0).color(headline_color),
        ]
        .align_x(Alignment::Center)
        .spacing(12)
        .padding(15);

        content = content.push(plot);

        if let Some(err) = &self.screen.error {
            content = content.push(text(err.clone()).color(RED));
        }

        content.into()
    }

    fn subscription(&self) -> Subscription<Message> {
        // One timer per outstanding ticket: a new ticket replaces the timer,
        // no ticket means no polling.
        let poll_sub = match self.monitor.scheduled_poll() {
            Some(ticket) => time::every(self.settings.poll_interval())
                .with(ticket)
                .map(|(ticket, _)| Message::Poll(ticket)),
            None => Subscription::none(),
        };

        let ports_sub = time::every(Duration::from_secs(2)).map(|_| Message::RefreshPorts);
        let close_sub = window::close_requests().map(|_| Message::Exit);

        Subscription::batch(vec![poll_sub, ports_sub, close_sub])
    }
}

fn main() -> iced::Result {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("TDS monitor starting");

    iced::application(
        TdsMonitorApp::title,
        TdsMonitorApp::update,
        TdsMonitorApp::view,
    )
    .subscription(TdsMonitorApp::subscription)
    .window(window::Settings {
        size: Size::new(980.0, 760.0),
        exit_on_close_request: false,
        ..Default::default()
    })
    .antialiasing(true)
    .run()
}
