use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    error::{StageError, StageResult},
    geom::{Point, Rect},
    pixel::PixelBuf,
    pool::Handle,
    raster::RasterImage,
};

/// Frame-advance state shared between the draw path and the ticker thread.
///
/// The ticker is the single writer; draws do an acquire load of the current
/// frame. Timestamps are milliseconds on the ticker's own epoch.
#[derive(Debug)]
pub struct FrameClock {
    frame: AtomicUsize,
    deadline_ms: AtomicU64,
    interval_ms: u64,
    frame_count: usize,
}

impl FrameClock {
    pub fn new(frame_count: usize, interval: Duration, now_ms: u64) -> Self {
        // zero values would make the catch-up arithmetic meaningless
        let interval_ms = (interval.as_millis() as u64).max(1);
        Self {
            frame: AtomicUsize::new(0),
            deadline_ms: AtomicU64::new(now_ms + interval_ms),
            interval_ms,
            frame_count: frame_count.max(1),
        }
    }

    /// Frame index in `[0, frame_count)`, as last published by the ticker.
    pub fn current_frame(&self) -> usize {
        self.frame.load(Ordering::Acquire)
    }

    /// Advance if due, coalescing late ticks: `k` elapsed intervals advance
    /// the frame by exactly `k` positions no matter how often this runs.
    pub(crate) fn tick(&self, now_ms: u64) {
        let deadline = self.deadline_ms.load(Ordering::Acquire);
        if now_ms < deadline {
            return;
        }

        let missed = 1 + (now_ms - deadline) / self.interval_ms;
        let step = (missed % self.frame_count as u64) as usize;
        let frame = self.frame.load(Ordering::Relaxed);
        self.frame
            .store((frame + step) % self.frame_count, Ordering::Release);
        self.deadline_ms
            .store(deadline + missed * self.interval_ms, Ordering::Release);
    }
}

/// How to slice an image into animation frames.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimationSpec {
    pub frames: Vec<Rect>,
    pub interval: Duration,
    #[serde(default)]
    pub location: Point,
    #[serde(default)]
    pub offset: Point,
}

/// An ordered frame sequence cycled by the ticker. Frames are independent
/// pixel copies, same rule as `Picture`.
#[derive(Debug)]
pub struct StaticAnimation {
    frames: Vec<PixelBuf>,
    clock: Arc<FrameClock>,
    location: Point,
    offset: Point,
}

impl StaticAnimation {
    pub fn from_image(image: &RasterImage, spec: AnimationSpec, now_ms: u64) -> StageResult<Self> {
        if spec.frames.is_empty() {
            return Err(StageError::validation(
                "static animation needs at least one frame",
            ));
        }

        let frames = spec
            .frames
            .iter()
            .map(|rect| image.subregion(*rect))
            .collect::<StageResult<Vec<_>>>()?;
        let clock = Arc::new(FrameClock::new(frames.len(), spec.interval, now_ms));

        Ok(Self {
            frames,
            clock,
            location: spec.location,
            offset: spec.offset,
        })
    }

    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Pixels of the frame the ticker has most recently published.
    pub fn current_pixels(&self) -> &PixelBuf {
        &self.frames[self.clock.current_frame() % self.frames.len()]
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    pub fn draw_origin(&self) -> Point {
        self.location + self.offset
    }
}

/// A fixed set of static animations selected by a caller-owned state cell.
///
/// The selector is shared: the caller keeps a clone of the `Arc` and flips
/// the value to switch animations; the next draw observes it without any
/// notification call.
#[derive(Debug)]
pub struct DynamicAnimation {
    animations: Vec<Handle<StaticAnimation>>,
    selector: Arc<AtomicUsize>,
}

impl DynamicAnimation {
    pub fn new(
        animations: Vec<Handle<StaticAnimation>>,
        selector: Arc<AtomicUsize>,
    ) -> StageResult<Self> {
        if animations.is_empty() {
            return Err(StageError::validation(
                "dynamic animation needs at least one static animation",
            ));
        }
        Ok(Self {
            animations,
            selector,
        })
    }

    /// Handle of the animation the selector currently points at.
    pub fn resolve(&self) -> StageResult<Handle<StaticAnimation>> {
        let index = self.selector.load(Ordering::Acquire);
        self.animations
            .get(index)
            .copied()
            .ok_or(StageError::InvalidHandle {
                pool: "dynamic animation selector",
                index,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_image(frames: u32) -> RasterImage {
        // one 2x2 tile per frame, laid out horizontally, tile i filled with i
        let width = frames * 2;
        let mut data = vec![0u8; (width * 2 * 4) as usize];
        for y in 0..2 {
            for x in 0..width {
                let v = (x / 2) as u8;
                let i = ((y * width + x) * 4) as usize;
                data[i..i + 4].copy_from_slice(&[v, v, v, 255]);
            }
        }
        RasterImage {
            pixels: PixelBuf::from_raw(width, 2, data).unwrap(),
            source: "strip.png".into(),
        }
    }

    fn strip_spec(frames: u32, interval_ms: u64) -> AnimationSpec {
        AnimationSpec {
            frames: (0..frames).map(|i| Rect::new(i * 2, 0, 2, 2)).collect(),
            interval: Duration::from_millis(interval_ms),
            location: Point::ZERO,
            offset: Point::ZERO,
        }
    }

    #[test]
    fn clock_advances_once_per_interval() {
        let clock = FrameClock::new(4, Duration::from_millis(100), 0);
        assert_eq!(clock.current_frame(), 0);

        // many ticks inside the first interval: no advance
        for now in [10, 50, 99] {
            clock.tick(now);
        }
        assert_eq!(clock.current_frame(), 0);

        clock.tick(100);
        assert_eq!(clock.current_frame(), 1);

        // repeated due checks within the next interval must not double-advance
        clock.tick(101);
        clock.tick(150);
        assert_eq!(clock.current_frame(), 1);
    }

    #[test]
    fn clock_catches_up_after_a_stall() {
        let clock = FrameClock::new(4, Duration::from_millis(100), 0);
        // single late tick after 3.5 intervals
        clock.tick(350);
        assert_eq!(clock.current_frame(), 3);

        // k elapsed intervals -> k mod frame_count, across the wrap
        clock.tick(620);
        assert_eq!(clock.current_frame(), 6 % 4);
    }

    #[test]
    fn clock_wraps_modulo_frame_count() {
        let clock = FrameClock::new(3, Duration::from_millis(10), 0);
        for step in 1..=7u64 {
            clock.tick(step * 10);
        }
        assert_eq!(clock.current_frame(), 7 % 3);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let clock = FrameClock::new(2, Duration::ZERO, 0);
        clock.tick(5);
        assert_eq!(clock.current_frame(), 1);
    }

    #[test]
    fn animation_frames_are_independent_copies() {
        let img = strip_image(3);
        let anim = StaticAnimation::from_image(&img, strip_spec(3, 100), 0).unwrap();
        assert_eq!(anim.frame_count(), 3);
        assert_eq!(anim.current_pixels().pixel(0, 0), Some([0, 0, 0, 255]));

        anim.clock().tick(100);
        assert_eq!(anim.current_pixels().pixel(0, 0), Some([1, 1, 1, 255]));
    }

    #[test]
    fn animation_rejects_empty_frame_list() {
        let img = strip_image(1);
        let spec = AnimationSpec {
            frames: vec![],
            interval: Duration::from_millis(50),
            location: Point::ZERO,
            offset: Point::ZERO,
        };
        assert!(matches!(
            StaticAnimation::from_image(&img, spec, 0),
            Err(StageError::Validation(_))
        ));
    }

    #[test]
    fn animation_rejects_out_of_bounds_frame() {
        let img = strip_image(2);
        let mut spec = strip_spec(2, 50);
        spec.frames.push(Rect::new(100, 0, 2, 2));
        assert!(StaticAnimation::from_image(&img, spec, 0).is_err());
    }

    #[test]
    fn dynamic_animation_resolves_selector() {
        let img = strip_image(2);
        let mut pool = crate::pool::Pool::new("static animation", 4);
        let a = pool
            .insert(StaticAnimation::from_image(&img, strip_spec(2, 50), 0).unwrap())
            .unwrap();
        let b = pool
            .insert(StaticAnimation::from_image(&img, strip_spec(2, 50), 0).unwrap())
            .unwrap();

        let selector = Arc::new(AtomicUsize::new(0));
        let dyn_anim = DynamicAnimation::new(vec![a, b], Arc::clone(&selector)).unwrap();

        assert_eq!(dyn_anim.resolve().unwrap(), a);
        selector.store(1, Ordering::Release);
        assert_eq!(dyn_anim.resolve().unwrap(), b);

        selector.store(5, Ordering::Release);
        assert!(matches!(
            dyn_anim.resolve(),
            Err(StageError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn dynamic_animation_rejects_empty_set() {
        let selector = Arc::new(AtomicUsize::new(0));
        assert!(DynamicAnimation::new(vec![], selector).is_err());
    }
}
