use std::num::NonZeroU32;
use std::rc::Rc;

use winit::window::Window;

use crate::error::Result;
use crate::renderer::Frame;
use crate::scaler::ScaleLut;

/// Minimal capability the display needs from whatever hosts it.
pub trait RenderTarget {
    /// Current size in pixels.
    fn size(&self) -> (usize, usize);

    /// Follow a host resize.
    fn resize(&mut self, width: usize, height: usize) -> Result<()>;

    /// Show a finished frame, stretched to the target size.
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// A winit window presented through softbuffer.
pub struct WindowTarget {
    window: Rc<Window>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    width: usize,
    height: usize,
    lut: ScaleLut,
}

impl WindowTarget {
    pub fn new(window: Rc<Window>) -> Result<Self> {
        let context = softbuffer::Context::new(window.clone())?;
        let surface = softbuffer::Surface::new(&context, window.clone())?;
        let size = window.inner_size();
        let mut target = Self {
            window,
            surface,
            width: 0,
            height: 0,
            lut: ScaleLut::empty(),
        };
        target.resize(size.width as usize, size.height as usize)?;
        Ok(target)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl RenderTarget for WindowTarget {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.width = width;
        self.height = height;
        if let (Some(w), Some(h)) = (NonZeroU32::new(width as u32), NonZeroU32::new(height as u32)) {
            self.surface.resize(w, h)?;
        }
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        let (dw, dh) = (self.width, self.height);
        if dw == 0 || dh == 0 {
            return Ok(()); // Minimized window, skip drawing
        }
        if !self.lut.fits(dw, dh, frame.width, frame.height) {
            self.lut = ScaleLut::new(dw, dh, frame.width, frame.height);
        }

        let mut buf = self.surface.buffer_mut()?;
        self.lut.blit(&mut buf, &frame.pixels);
        buf.present()?;
        Ok(())
    }
}
