use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Windowed,
    /// Borderless, on whichever monitor the window opened on.
    Fullscreen,
}

#[derive(Debug, Clone)]
pub struct WindowCreateInfo {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub screen_mode: ScreenMode,
    pub present_mode: wgpu::PresentMode,
    pub resizable: bool,
}

impl WindowCreateInfo {
    pub fn standard() -> Self {
        WindowCreateInfo {
            title: String::from("Main Window"),
            width: 640,
            height: 480,
            screen_mode: ScreenMode::Windowed,
            present_mode: wgpu::PresentMode::Fifo,
            resizable: false,
        }
    }
    /// Size, title and resizability only; the framework applies
    /// `screen_mode` to the built window and `present_mode` to the swap chain.
    pub(crate) fn to_window_builder(&self) -> winit::window::WindowBuilder {
        winit::window::WindowBuilder::new()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLimiterSettings {
    Uncapped,
    Capped(u32),
}

impl FrameLimiterSettings {
    pub fn standard() -> Self {
        FrameLimiterSettings::Capped(60)
    }
    pub fn target_frametime(&self) -> Option<Duration> {
        match *self {
            FrameLimiterSettings::Capped(cap) if cap > 0 => {
                Some(Duration::from_secs_f64(1.0 / cap as f64))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_window() {
        let info = WindowCreateInfo::standard();
        assert_eq!(info.title, "Main Window");
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.screen_mode, ScreenMode::Windowed);
        assert_eq!(info.present_mode, wgpu::PresentMode::Fifo);
        assert!(!info.resizable);
    }

    #[test]
    fn capped_frametime() {
        let frametime = FrameLimiterSettings::standard().target_frametime().unwrap();
        assert!((frametime.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn uncapped_frametime() {
        assert_eq!(FrameLimiterSettings::Uncapped.target_frametime(), None);
        assert_eq!(FrameLimiterSettings::Capped(0).target_frametime(), None);
    }
}
