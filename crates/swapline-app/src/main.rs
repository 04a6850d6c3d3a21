// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use swapline_core::init_tracing;
use swapline_vk::{AshDriver, DeviceRequirements, InstanceSettings, Pipeline};
use tracing::{error, info, warn};

use swapline_platform::winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};
use swapline_platform::AppWindow;

use config::{load_cfg, AppCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML); missing means defaults
    #[arg(long, default_value = "swapline.toml")]
    config: PathBuf,
    /// Override the validation setting: on | off
    #[arg(long, value_enum)]
    validation: Option<Toggle>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Toggle {
    On,
    Off,
}

struct App {
    cfg: AppCfg,
    validation: bool,
    requirements: DeviceRequirements,
    // dropped before the window: the surface must not outlive it
    pipeline: Option<Pipeline<AshDriver>>,
    window: Option<AppWindow>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn init_pipeline(&self, window: &AppWindow) -> Result<Pipeline<AshDriver>> {
        let settings = InstanceSettings {
            validation: self.validation,
            ..Default::default()
        };
        let driver = AshDriver::new(window, &settings).context("vulkan instance")?;
        Pipeline::initialize(driver, window, &self.requirements)
            .context("device and swapchain negotiation")
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{e:#}");
        self.failure = Some(e);
        self.pipeline = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.cfg.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.cfg.window.width as f64,
                self.cfg.window.height as f64,
            ))
            .with_resizable(self.cfg.window.resizable);
        let window = match event_loop.create_window(attrs) {
            Ok(w) => AppWindow::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("create_window"));
                return;
            }
        };

        match self.init_pipeline(&window) {
            Ok(pipeline) => {
                if let Some(chain) = pipeline.chain() {
                    info!(
                        "ready: {} images {}x{} on {}",
                        chain.images.len(),
                        chain.extent().width,
                        chain.extent().height,
                        pipeline.adapter().map(|a| a.name.as_str()).unwrap_or("?")
                    );
                }
                self.pipeline = Some(pipeline);
                self.window = Some(window);
            }
            Err(e) => self.fail(event_loop, e),
        }

        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.window().id() {
                return;
            }
        }

        if let WindowEvent::CloseRequested = event {
            info!("CloseRequested");
            self.pipeline = None;
            self.window = None;
            event_loop.exit();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (cfg, cfg_err) = match load_cfg(&args.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppCfg::default(), Some(e)),
    };
    init_tracing(&cfg.diagnostics.log_filter);
    if let Some(e) = cfg_err {
        warn!("{e:#}; using defaults");
    }

    let validation = match args.validation {
        Some(Toggle::On) => true,
        Some(Toggle::Off) => false,
        None => cfg.diagnostics.validation,
    };
    info!("validation = {validation}");

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        validation,
        requirements: DeviceRequirements::standard(),
        pipeline: None,
        window: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
