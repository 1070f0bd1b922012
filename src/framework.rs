use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use winit::{
    event::{self, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

use crate::input::Keyboard;
use crate::settings::{FrameLimiterSettings, ScreenMode, WindowCreateInfo};

///////////////////////////////////////////////////////////////////////////////
// EXAMPLE
///////////////////////////////////////////////////////////////////////////////

pub trait Example: 'static + Sized {
    fn optional_features() -> wgpu::Features {
        wgpu::Features::empty()
    }
    fn required_features() -> wgpu::Features {
        wgpu::Features::empty()
    }
    fn required_limits() -> wgpu::Limits {
        wgpu::Limits::default()
    }
    fn init(
        sc_desc: &wgpu::SwapChainDescriptor,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Self>;
    /// Called once per frame, before `render`.
    fn update(&mut self, _keyboard: &Keyboard, _delta: Duration) {}
    fn resize(
        &mut self,
        _sc_desc: &wgpu::SwapChainDescriptor,
        _device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) {
    }
    fn render(
        &mut self,
        frame: &wgpu::SwapChainTexture,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    );
}

///////////////////////////////////////////////////////////////////////////////
// SETUP
///////////////////////////////////////////////////////////////////////////////

struct Setup {
    window: winit::window::Window,
    event_loop: EventLoop<()>,
    instance: wgpu::Instance,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

async fn setup<E: Example>(window_info: &WindowCreateInfo) -> Result<Setup> {
    let event_loop = EventLoop::new();
    let window = window_info
        .to_window_builder()
        .build(&event_loop)
        .context("Unable to create window")?;
    if window_info.screen_mode == ScreenMode::Fullscreen {
        let monitor = window.current_monitor();
        window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(monitor)));
    }
    let backend = wgpu::BackendBit::PRIMARY;
    let power_preference = wgpu::PowerPreference::LowPower;
    let instance = wgpu::Instance::new(backend);
    let (size, surface) = unsafe {
        let size = window.inner_size();
        let surface = instance.create_surface(&window);
        (size, surface)
    };
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
        })
        .await
        .context("No suitable GPU adapters found on the system!")?;

    let adapter_info = adapter.get_info();
    log::info!("Using {} ({:?})", adapter_info.name, adapter_info.backend);

    let optional_features = E::optional_features();
    let required_features = E::required_features();
    let adapter_features = adapter.features();
    anyhow::ensure!(
        adapter_features.contains(required_features),
        "Adapter does not support required features for this app: {:?}",
        required_features - adapter_features
    );

    let needed_limits = E::required_limits();

    let trace_dir = std::env::var("WGPU_TRACE");
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: (optional_features & adapter_features) | required_features,
                limits: needed_limits,
            },
            trace_dir.ok().as_ref().map(std::path::Path::new),
        )
        .await
        .context("Unable to find a suitable GPU adapter!")?;

    Ok(Setup {
        window,
        event_loop,
        instance,
        size,
        surface,
        adapter,
        device,
        queue,
    })
}

///////////////////////////////////////////////////////////////////////////////
// FRAME PACING
///////////////////////////////////////////////////////////////////////////////

/// Decides when the next update/draw is due.
pub struct FrameLimiter {
    target_frametime: Option<Duration>,
    last_update_inst: Instant,
}

impl FrameLimiter {
    pub fn new(settings: FrameLimiterSettings, now: Instant) -> Self {
        FrameLimiter {
            target_frametime: settings.target_frametime(),
            last_update_inst: now,
        }
    }

    /// `Ok(delta)` when a frame is due (and starts it), otherwise
    /// `Err(deadline)` for the next one.
    pub fn poll(&mut self, now: Instant) -> std::result::Result<Duration, Instant> {
        let time_since_last_frame = now.saturating_duration_since(self.last_update_inst);
        match self.target_frametime {
            Some(target) if time_since_last_frame < target => {
                Err(self.last_update_inst + target)
            }
            _ => {
                self.last_update_inst = now;
                Ok(time_since_last_frame)
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// INGRESS - START
///////////////////////////////////////////////////////////////////////////////

fn sanitize_size(size: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (size.width.max(1), size.height.max(1))
}

fn start<E: Example>(setup: Setup, window_info: &WindowCreateInfo, frame_limiter: FrameLimiterSettings) -> Result<()> {
    let Setup {window, event_loop, instance, size, surface, adapter, device, queue} = setup;
    let (width, height) = sanitize_size(size);
    let mut sc_desc = wgpu::SwapChainDescriptor {
        usage: wgpu::TextureUsage::RENDER_ATTACHMENT,
        format: adapter.get_swap_chain_preferred_format(&surface),
        width,
        height,
        present_mode: window_info.present_mode,
    };
    let mut swap_chain = device.create_swap_chain(&surface, &sc_desc);
    let mut app = E::init(&sc_desc, &adapter, &device, &queue)
        .context("Unable to initialize example")?;
    let mut keyboard = Keyboard::new();
    let mut limiter = FrameLimiter::new(frame_limiter, Instant::now());
    let mut minimized = size.width == 0 || size.height == 0;

    ///////////////////////////////////////////////////////////////////////////
    // EVENT LOOP
    ///////////////////////////////////////////////////////////////////////////
    event_loop.run(move |event, _, control_flow| {
        let _ = (&instance, &adapter); // force ownership by the closure
        ///////////////////////////////////////////////////////////////////////
        // EVENT LOOP HELPERS
        ///////////////////////////////////////////////////////////////////////
        let is_exit_window_event = |event: &WindowEvent| -> bool {
            match event {
                WindowEvent::KeyboardInput {
                    input:
                        event::KeyboardInput {
                            virtual_keycode: Some(event::VirtualKeyCode::Escape),
                            state: event::ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    true
                }
                WindowEvent::CloseRequested => {
                    true
                }
                _ => {
                    false
                }
            }
        };
        ///////////////////////////////////////////////////////////////////////
        // EVENTS
        ///////////////////////////////////////////////////////////////////////
        match event {
            ///////////////////////////////////////////////////////////////////
            // PRE-DRAW - UPDATE, THEN ASK FOR A REDRAW WHEN A FRAME IS DUE
            ///////////////////////////////////////////////////////////////////
            event::Event::MainEventsCleared if *control_flow != ControlFlow::Exit => {
                match limiter.poll(Instant::now()) {
                    Ok(delta) => {
                        app.update(&keyboard, delta);
                        keyboard.end_frame();
                        window.request_redraw();
                        *control_flow = ControlFlow::Poll;
                    }
                    Err(deadline) => {
                        *control_flow = ControlFlow::WaitUntil(deadline);
                    }
                }
            }
            ///////////////////////////////////////////////////////////////////
            // RESIZE WINDOW EVENT
            ///////////////////////////////////////////////////////////////////
            event::Event::WindowEvent {event: WindowEvent::Resized(size), ..} => {
                minimized = size.width == 0 || size.height == 0;
                if minimized {
                    log::debug!("window minimized, skipping frames");
                    return;
                }
                let (width, height) = sanitize_size(size);
                sc_desc.width = width;
                sc_desc.height = height;
                swap_chain = device.create_swap_chain(&surface, &sc_desc);
                app.resize(&sc_desc, &device, &queue);
            }
            ///////////////////////////////////////////////////////////////////
            // GENERAL WINDOW EVENT
            ///////////////////////////////////////////////////////////////////
            event::Event::WindowEvent { event, .. } => match event {
                e if is_exit_window_event(&e) => {
                    *control_flow = ControlFlow::Exit;
                }
                e => keyboard.handle_event(&e),
            },
            ///////////////////////////////////////////////////////////////////
            // REDRAW
            ///////////////////////////////////////////////////////////////////
            event::Event::RedrawRequested(_) if !minimized => {
                match swap_chain.get_current_frame() {
                    Ok(frame) => {
                        app.render(&frame.output, &device, &queue);
                    }
                    Err(wgpu::SwapChainError::Timeout) => {
                        log::debug!("swap chain timed out, skipping frame");
                    }
                    Err(wgpu::SwapChainError::Outdated) | Err(wgpu::SwapChainError::Lost) => {
                        log::debug!("recreating swap chain");
                        swap_chain = device.create_swap_chain(&surface, &sc_desc);
                    }
                    Err(wgpu::SwapChainError::OutOfMemory) => {
                        log::error!("out of memory acquiring swap chain texture");
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            ///////////////////////////////////////////////////////////////////
            // NOTHING TO DO
            ///////////////////////////////////////////////////////////////////
            _ => {}
        }
    })
}

///////////////////////////////////////////////////////////////////////////////
// ENTRYPOINT
///////////////////////////////////////////////////////////////////////////////

pub fn run<E: Example>(window_info: WindowCreateInfo, frame_limiter: FrameLimiterSettings) -> Result<()> {
    wgpu_subscriber::initialize_default_subscriber(None);
    let setup = pollster::block_on(setup::<E>(&window_info))?;
    start::<E>(setup, &window_info, frame_limiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_limiter_waits() {
        let start = Instant::now();
        let mut limiter = FrameLimiter::new(FrameLimiterSettings::Capped(60), start);
        let frametime = Duration::from_secs_f64(1.0 / 60.0);

        assert_eq!(limiter.poll(start + Duration::from_millis(5)), Err(start + frametime));

        let later = start + Duration::from_millis(20);
        assert_eq!(limiter.poll(later), Ok(Duration::from_millis(20)));
        assert_eq!(limiter.poll(later), Err(later + frametime));
    }

    #[test]
    fn uncapped_limiter_never_waits() {
        let start = Instant::now();
        let mut limiter = FrameLimiter::new(FrameLimiterSettings::Uncapped, start);
        assert_eq!(limiter.poll(start), Ok(Duration::from_secs(0)));
        assert_eq!(limiter.poll(start + Duration::from_millis(1)), Ok(Duration::from_millis(1)));
    }

    #[test]
    fn zero_size_is_clamped() {
        assert_eq!(sanitize_size(winit::dpi::PhysicalSize::new(0, 0)), (1, 1));
        assert_eq!(sanitize_size(winit::dpi::PhysicalSize::new(640, 480)), (640, 480));
    }
}
