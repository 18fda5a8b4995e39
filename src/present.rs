use crate::{
    geom::{Point, Size},
    pixel::PixelBuf,
};

/// The native window/double-buffer primitive, reduced to its interface.
///
/// The engine draws into whatever buffer `acquire` hands back and flips it
/// with `present`; it never creates windows itself. A real windowing backend
/// implements this trait; [`MemoryTarget`] is the headless implementation
/// used by the CLI and the tests.
pub trait PresentTarget {
    /// Physical size of the presentation surface in pixels.
    fn size(&self) -> Size;

    /// Next back buffer to draw into. Contents are whatever the buffer held
    /// the last time it was presented; the renderer clears it.
    fn acquire(&mut self) -> &mut PixelBuf;

    /// Flip: publish the buffer last returned by `acquire`.
    fn present(&mut self);

    /// Pointer position in physical surface coordinates, if the backend has
    /// a pointer at all.
    fn pointer_position(&self) -> Option<Point> {
        None
    }

    /// True once the user asked to close the window. Reacting to it (e.g.
    /// exiting the process) is the embedder's job.
    fn close_requested(&self) -> bool {
        false
    }

    fn set_title(&mut self, _title: &str) {}
}

/// In-memory rotating buffer chain: double buffering by default, triple or
/// more if asked.
#[derive(Debug)]
pub struct MemoryTarget {
    size: Size,
    buffers: Vec<PixelBuf>,
    back: usize,
    front: usize,
    title: String,
}

impl MemoryTarget {
    pub fn new(size: Size, buffer_count: usize) -> Self {
        let buffer_count = buffer_count.max(2);
        Self {
            size,
            buffers: (0..buffer_count)
                .map(|_| PixelBuf::new(size.width, size.height))
                .collect(),
            back: 0,
            front: buffer_count - 1,
            title: String::new(),
        }
    }

    /// The most recently presented buffer.
    pub fn front(&self) -> &PixelBuf {
        &self.buffers[self.front]
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl PresentTarget for MemoryTarget {
    fn size(&self) -> Size {
        self.size
    }

    fn acquire(&mut self) -> &mut PixelBuf {
        &mut self.buffers[self.back]
    }

    fn present(&mut self) {
        self.front = self.back;
        self.back = (self.back + 1) % self.buffers.len();
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}
