//! 2D textures and asynchronous image loading.
//!
//! [`Texture2D`] wraps one texture object on the context. Render targets and
//! data samplers are created fully loaded from [`Texture2D::empty`] /
//! [`Texture2D::from_data`]; image-backed textures come from a
//! [`TextureLoader`], which decodes files on a worker thread and finishes the
//! GPU upload on the event-loop thread during [`TextureLoader::poll`]. Until
//! that happens the texture reports `is_loaded() == false` and samplers bound
//! to it are skipped for the frame.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use log::{debug, error, info};

use crate::context::{RenderingContext, TexParameter, TexValue, TextureId};
use crate::error::Result;

pub struct Texture2D {
    ctx: Rc<dyn RenderingContext>,
    id: TextureId,
    width: Cell<u32>,
    height: Cell<u32>,
    loaded: Cell<bool>,
    use_mipmap: bool,
}

impl Texture2D {
    /// An uninitialized texture of the given size, e.g. a render target.
    /// Counts as loaded from the start.
    pub fn empty(ctx: Rc<dyn RenderingContext>, width: u32, height: u32) -> Result<Self> {
        let tex = Self::create(ctx, false)?;
        tex.ctx.upload_texture(tex.id, width, height, None);
        tex.width.set(width);
        tex.height.set(height);
        tex.loaded.set(true);
        Ok(tex)
    }

    /// A texture filled with the given tightly packed RGB bytes.
    pub fn from_data(
        ctx: Rc<dyn RenderingContext>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        let tex = Self::create(ctx, false)?;
        tex.upload(width, height, pixels);
        Ok(tex)
    }

    fn create(ctx: Rc<dyn RenderingContext>, use_mipmap: bool) -> Result<Self> {
        let id = ctx.create_texture()?;
        // Linear filtering and edge clamping work for any size; GL's
        // mipmapped default would sample an incomplete texture.
        ctx.set_texture_parameter(id, TexParameter::MinFilter, TexValue::Linear);
        ctx.set_texture_parameter(id, TexParameter::MagFilter, TexValue::Linear);
        ctx.set_texture_parameter(id, TexParameter::WrapS, TexValue::ClampToEdge);
        ctx.set_texture_parameter(id, TexParameter::WrapT, TexValue::ClampToEdge);
        Ok(Self {
            ctx,
            id,
            width: Cell::new(0),
            height: Cell::new(0),
            loaded: Cell::new(false),
            use_mipmap,
        })
    }

    fn upload(&self, width: u32, height: u32, pixels: &[u8]) {
        self.ctx.upload_texture(self.id, width, height, Some(pixels));
        if self.use_mipmap {
            self.ctx.generate_mipmaps(self.id);
            self.ctx.set_texture_parameter(
                self.id,
                TexParameter::MinFilter,
                TexValue::LinearMipmapLinear,
            );
        }
        self.width.set(width);
        self.height.set(height);
        self.loaded.set(true);
    }

    /// Whether pixel data has arrived. Textures that are not loaded yet are
    /// skipped by sampler binds instead of failing the frame.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }

    /// Change a sampling parameter, e.g. nearest filtering for data samplers.
    pub fn set_parameter(&self, param: TexParameter, value: TexValue) {
        self.ctx.set_texture_parameter(self.id, param, value);
    }

    pub(crate) fn id(&self) -> TextureId {
        self.id
    }
}

type LoadCallback = Box<dyn FnOnce(&Texture2D)>;

struct PendingLoad {
    texture: Weak<Texture2D>,
    path: PathBuf,
    on_loaded: Option<LoadCallback>,
}

struct Decoded {
    job: usize,
    result: std::result::Result<(u32, u32, Vec<u8>), String>,
}

/// Asynchronous image-file loader.
///
/// `load` hands back a usable (but not yet loaded) texture immediately and
/// decodes the file on a worker thread; `poll`, called once per frame on the
/// event-loop thread, performs the GPU uploads for whatever finished since
/// the last call. Dropping a texture mid-load cancels its upload: the loader
/// only holds weak references.
pub struct TextureLoader {
    ctx: Rc<dyn RenderingContext>,
    sender: Sender<Decoded>,
    receiver: Receiver<Decoded>,
    jobs: RefCell<Vec<Option<PendingLoad>>>,
    pending: Cell<usize>,
    on_all_loaded: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl TextureLoader {
    pub fn new(ctx: Rc<dyn RenderingContext>) -> Self {
        let (sender, receiver) = channel();
        Self {
            ctx,
            sender,
            receiver,
            jobs: RefCell::new(Vec::new()),
            pending: Cell::new(0),
            on_all_loaded: RefCell::new(None),
        }
    }

    /// Register a callback fired once every texture requested so far has
    /// finished loading. Replaces any previously registered callback.
    pub fn on_all_loaded(&self, callback: Box<dyn FnOnce()>) {
        *self.on_all_loaded.borrow_mut() = Some(callback);
    }

    pub fn num_pending(&self) -> usize {
        self.pending.get()
    }

    /// Start loading `path`. The returned texture is usable immediately and
    /// flips to loaded during a later [`poll`](Self::poll).
    pub fn load(
        &self,
        path: &Path,
        use_mipmap: bool,
        on_loaded: Option<LoadCallback>,
    ) -> Result<Rc<Texture2D>> {
        let texture = Rc::new(Texture2D::create(Rc::clone(&self.ctx), use_mipmap)?);

        let mut jobs = self.jobs.borrow_mut();
        let job = jobs.len();
        jobs.push(Some(PendingLoad {
            texture: Rc::downgrade(&texture),
            path: path.to_owned(),
            on_loaded,
        }));
        self.pending.set(self.pending.get() + 1);

        let sender = self.sender.clone();
        let path = path.to_owned();
        thread::spawn(move || {
            let result = decode(&path);
            // The receiver only disappears when the loader itself is gone.
            let _ = sender.send(Decoded { job, result });
        });
        Ok(texture)
    }

    /// Drain finished decodes and upload them. Call once per frame on the
    /// thread that owns the rendering context.
    pub fn poll(&self) {
        while let Ok(decoded) = self.receiver.try_recv() {
            let Some(load) = self.jobs.borrow_mut()[decoded.job].take() else {
                continue;
            };
            self.pending.set(self.pending.get() - 1);

            match decoded.result {
                Ok((width, height, pixels)) => match load.texture.upgrade() {
                    Some(texture) => {
                        texture.upload(width, height, &pixels);
                        info!("texture {} loaded ({width}x{height})", load.path.display());
                        if let Some(callback) = load.on_loaded {
                            callback(&texture);
                        }
                    }
                    None => {
                        debug!(
                            "texture {} was dropped before its data arrived",
                            load.path.display()
                        );
                    }
                },
                Err(message) => {
                    error!("failed to load texture {}: {message}", load.path.display());
                }
            }

            if self.pending.get() == 0 {
                if let Some(callback) = self.on_all_loaded.borrow_mut().take() {
                    callback();
                }
            }
        }
    }
}

fn decode(path: &Path) -> std::result::Result<(u32, u32, Vec<u8>), String> {
    let image = image::open(path).map_err(|e| e.to_string())?;
    // GL addresses rows bottom-up.
    let image = image.flipv().to_rgb8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}
