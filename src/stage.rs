use std::{
    path::Path,
    sync::{Arc, atomic::AtomicUsize},
};

use crate::{
    anim::{AnimationSpec, DynamicAnimation, StaticAnimation},
    config::StageConfig,
    error::StageResult,
    geom::Point,
    pool::{Handle, Pool},
    present::{MemoryTarget, PresentTarget},
    raster::RasterImage,
    sprite::{Picture, PictureSpec, Surface, SurfaceSpec},
    ticker::{AnimationTicker, TICK_QUANTUM},
};

/// The resource pools and compositing engine, bound to one presentation
/// target.
///
/// All pool mutation happens on the caller's thread; the only concurrent
/// actor is the animation ticker, which touches nothing but the atomic
/// frame clocks.
pub struct Stage<T: PresentTarget> {
    // declared first so the ticker joins before any pool drops
    ticker: AnimationTicker,
    images: Pool<RasterImage>,
    pictures: Pool<Picture>,
    surfaces: Pool<Surface>,
    static_animations: Pool<StaticAnimation>,
    dynamic_animations: Pool<DynamicAnimation>,
    target: T,
    config: StageConfig,
}

impl Stage<MemoryTarget> {
    /// Stage backed by an in-memory buffer chain sized from the config.
    pub fn headless(config: StageConfig) -> StageResult<Self> {
        let target = MemoryTarget::new(
            crate::geom::Size::new(config.width, config.height),
            config.buffer_count,
        );
        Self::new(config, target)
    }
}

impl<T: PresentTarget> Stage<T> {
    pub fn new(config: StageConfig, mut target: T) -> StageResult<Self> {
        config.validate()?;
        target.set_title(&config.title);

        let ticker = AnimationTicker::spawn(TICK_QUANTUM)?;
        tracing::debug!(
            width = config.width,
            height = config.height,
            resolution_bit = config.resolution_bit,
            "stage created"
        );

        Ok(Self {
            ticker,
            images: Pool::new("image", config.image_capacity),
            pictures: Pool::new("picture", config.picture_capacity),
            surfaces: Pool::new("surface", config.surface_capacity),
            static_animations: Pool::new("static animation", config.static_animation_capacity),
            dynamic_animations: Pool::new("dynamic animation", config.dynamic_animation_capacity),
            target,
            config,
        })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Logical screen size: physical size right-shifted by the resolution bit.
    pub fn logical_size(&self) -> crate::geom::Size {
        self.target.size().shr(self.config.resolution_bit)
    }

    // ---- resource creation ----------------------------------------------

    #[tracing::instrument(skip(self))]
    pub fn load_image(&mut self, path: &Path) -> StageResult<Handle<RasterImage>> {
        let image = RasterImage::load(path)?;
        self.images.insert(image)
    }

    pub fn create_picture(
        &mut self,
        image: Handle<RasterImage>,
        spec: PictureSpec,
    ) -> StageResult<Handle<Picture>> {
        let picture = Picture::from_image(self.images.get(image)?, spec)?;
        self.pictures.insert(picture)
    }

    pub fn create_surface(&mut self, spec: SurfaceSpec) -> StageResult<Handle<Surface>> {
        let size = spec.size.unwrap_or_else(|| self.logical_size());
        self.surfaces.insert(Surface::new(spec.location, size))
    }

    pub fn create_static_animation(
        &mut self,
        image: Handle<RasterImage>,
        spec: AnimationSpec,
    ) -> StageResult<Handle<StaticAnimation>> {
        let now_ms = self.ticker.now_ms();
        let anim = StaticAnimation::from_image(self.images.get(image)?, spec, now_ms)?;
        self.ticker.register(anim.clock());
        self.static_animations.insert(anim)
    }

    pub fn create_dynamic_animation(
        &mut self,
        animations: Vec<Handle<StaticAnimation>>,
        selector: Arc<AtomicUsize>,
    ) -> StageResult<Handle<DynamicAnimation>> {
        self.dynamic_animations
            .insert(DynamicAnimation::new(animations, selector)?)
    }

    // ---- release / queries ----------------------------------------------

    pub fn release_image(&mut self, handle: Handle<RasterImage>) {
        self.images.release(handle);
    }

    pub fn release_picture(&mut self, handle: Handle<Picture>) {
        self.pictures.release(handle);
    }

    pub fn release_surface(&mut self, handle: Handle<Surface>) {
        self.surfaces.release(handle);
    }

    pub fn release_static_animation(&mut self, handle: Handle<StaticAnimation>) {
        self.static_animations.release(handle);
    }

    pub fn release_dynamic_animation(&mut self, handle: Handle<DynamicAnimation>) {
        self.dynamic_animations.release(handle);
    }

    /// True once every loaded image has been released.
    pub fn images_is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image_size(&self, handle: Handle<RasterImage>) -> StageResult<crate::geom::Size> {
        Ok(self.images.get(handle)?.pixels.size())
    }

    pub fn picture_is_live(&self, handle: Handle<Picture>) -> bool {
        self.pictures.contains(handle)
    }

    // ---- mutation --------------------------------------------------------

    pub fn set_picture_location(
        &mut self,
        handle: Handle<Picture>,
        location: Point,
    ) -> StageResult<()> {
        self.pictures.get_mut(handle)?.set_location(location);
        Ok(())
    }

    pub fn set_static_animation_location(
        &mut self,
        handle: Handle<StaticAnimation>,
        location: Point,
    ) -> StageResult<()> {
        self.static_animations
            .get_mut(handle)?
            .set_location(location);
        Ok(())
    }

    /// Permanently composite a picture into a surface at the picture's own
    /// location, consuming the picture's pool slot. Irreversible: there is
    /// no way to remove a baked picture again.
    ///
    /// A vacant or stale picture handle is a benign no-op (the picture may
    /// already have been baked); a bad surface handle is an error.
    pub fn bake_picture(
        &mut self,
        picture: Handle<Picture>,
        surface: Handle<Surface>,
    ) -> StageResult<()> {
        let surf = self.surfaces.get_mut(surface)?;
        if let Some(pic) = self.pictures.release(picture) {
            surf.bake(pic);
        }
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.config.title = title.to_string();
        self.target.set_title(title);
    }

    /// Pointer position in logical coordinates, if the target has one.
    pub fn pointer_position(&self) -> Option<Point> {
        let bit = self.config.resolution_bit;
        self.target
            .pointer_position()
            .map(|p| Point::new(p.x >> bit, p.y >> bit))
    }

    pub fn close_requested(&self) -> bool {
        self.target.close_requested()
    }

    // ---- drawing ---------------------------------------------------------

    /// Acquire and clear the next buffer. The returned pass borrows the
    /// stage mutably, so begin/finish pairing is enforced by the borrow
    /// checker: no second pass and no pool mutation until this one is done.
    pub fn begin_drawing(&mut self) -> DrawPass<'_, T> {
        self.target.acquire().clear();
        DrawPass { stage: self }
    }

    fn blit_picture(&mut self, handle: Handle<Picture>) -> StageResult<()> {
        let bit = self.config.resolution_bit;
        let pic = self.pictures.get(handle)?;
        let origin = pic.draw_origin();
        let pixels = pic.pixels();
        self.target.acquire().blit_scaled(pixels, origin, bit);
        Ok(())
    }

    fn blit_surface(&mut self, handle: Handle<Surface>) -> StageResult<()> {
        let bit = self.config.resolution_bit;
        let surf = self.surfaces.get(handle)?;
        let origin = surf.location();
        let pixels = surf.pixels();
        self.target.acquire().blit_scaled(pixels, origin, bit);
        Ok(())
    }

    fn blit_static_animation(&mut self, handle: Handle<StaticAnimation>) -> StageResult<()> {
        let bit = self.config.resolution_bit;
        let anim = self.static_animations.get(handle)?;
        let origin = anim.draw_origin();
        let pixels = anim.current_pixels();
        self.target.acquire().blit_scaled(pixels, origin, bit);
        Ok(())
    }

    fn blit_dynamic_animation(&mut self, handle: Handle<DynamicAnimation>) -> StageResult<()> {
        let selected = self.dynamic_animations.get(handle)?.resolve()?;
        self.blit_static_animation(selected)
    }
}

/// One frame's draw pass. Draw calls blit in call order (later calls paint
/// over earlier ones); `finish` presents the buffer.
pub struct DrawPass<'a, T: PresentTarget> {
    stage: &'a mut Stage<T>,
}

impl<T: PresentTarget> DrawPass<'_, T> {
    pub fn draw_picture(&mut self, handle: Handle<Picture>) -> StageResult<()> {
        self.stage.blit_picture(handle)
    }

    pub fn draw_surface(&mut self, handle: Handle<Surface>) -> StageResult<()> {
        self.stage.blit_surface(handle)
    }

    pub fn draw_static_animation(&mut self, handle: Handle<StaticAnimation>) -> StageResult<()> {
        self.stage.blit_static_animation(handle)
    }

    pub fn draw_dynamic_animation(&mut self, handle: Handle<DynamicAnimation>) -> StageResult<()> {
        self.stage.blit_dynamic_animation(handle)
    }

    /// Present (flip) the buffer drawn by this pass.
    pub fn finish(self) {
        self.stage.target.present();
    }
}
