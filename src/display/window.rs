//! SDL2 window host: one resizable window exposing one named surface

use super::{PixelBuffer, Rgb, SurfaceHost};
use crate::error::{Result, SakuraError};

use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::{BlendMode, Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    surface_id: String,
    width: u32,
    height: u32,
}

pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
    Resized { width: u32, height: u32 },
}

fn sdl_err(e: impl ToString) -> SakuraError {
    SakuraError::Display(e.to_string())
}

impl Display {
    /// Create a resizable window whose drawable area is the surface `surface_id`
    /// vsync=true: locked to monitor refresh
    /// vsync=false: uncapped, the caller paces frames
    pub fn with_options(
        title: &str,
        surface_id: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>)> {
        let sdl_context = sdl2::init().map_err(sdl_err)?;
        let video_subsystem = sdl_context.video().map_err(sdl_err)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(sdl_err)?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(sdl_err)?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(sdl_err)?;

        Ok((
            Self {
                canvas,
                event_pump,
                surface_id: surface_id.to_string(),
                width,
                height,
            },
            texture_creator,
        ))
    }

    /// Paint the backdrop, then alpha-blend the transparent surface over it
    pub fn present(
        &mut self,
        target: &mut RenderTarget,
        buffer: &PixelBuffer,
        backdrop: Rgb,
    ) -> Result<()> {
        target
            .texture
            .update(None, buffer.as_bytes(), (buffer.width() * 4) as usize)
            .map_err(sdl_err)?;

        self.canvas
            .set_draw_color(Color::RGB(backdrop.r, backdrop.g, backdrop.b));
        self.canvas.clear();
        self.canvas
            .copy(&target.texture, None, None)
            .map_err(sdl_err)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                Event::Window {
                    win_event: WindowEvent::SizeChanged(w, h),
                    ..
                } if w > 0 && h > 0 => {
                    self.width = w as u32;
                    self.height = h as u32;
                    events.push(InputEvent::Resized {
                        width: self.width,
                        height: self.height,
                    });
                },
                _ => {},
            }
        }

        events
    }
}

impl SurfaceHost for Display {
    fn surface_size(&self, id: &str) -> Option<(u32, u32)> {
        (id == self.surface_id).then_some((self.width, self.height))
    }
}

impl<'a> RenderTarget<'a> {
    /// Create a streaming texture that blends over the backdrop
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let mut texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
            .map_err(sdl_err)?;
        texture.set_blend_mode(BlendMode::Blend);
        Ok(Self {
            texture,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
