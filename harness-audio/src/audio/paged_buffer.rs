//! Append-only paged PCM buffer
//!
//! A stream appends one page per write and the mixer reads pages on the
//! audio callback thread. Pages are immutable once appended, so readers only
//! need a brief read lock on the page list.
//!
//! # Invariants
//! - `frame_count()` never decreases
//! - a page's bytes never change after `append`
//! - the frame counter is advanced only after the page is visible, so a
//!   reader that observes N frames can always read all N of them

use crate::audio::format::SampleFormat;
use crate::engine::DataSource;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One immutable chunk of interleaved PCM frames
#[derive(Debug)]
pub struct Page {
    frames: usize,
    data: Box<[u8]>,
}

impl Page {
    /// Build a page from interleaved PCM bytes.
    ///
    /// A trailing partial frame is dropped.
    pub fn new(mut data: Vec<u8>, frame_size: usize) -> Self {
        let frames = data.len() / frame_size;
        data.truncate(frames * frame_size);
        Self {
            frames,
            data: data.into_boxed_slice(),
        }
    }

    /// Build a page by copying caller-owned bytes.
    pub fn from_slice(data: &[u8], frame_size: usize) -> Self {
        let frames = data.len() / frame_size;
        Self::new(data[..frames * frame_size].to_vec(), frame_size)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

struct PageEntry {
    start_frame: u64,
    page: Arc<Page>,
}

impl PageEntry {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.page.frames() as u64
    }
}

/// Growable sequence of PCM pages sharing one format
pub struct PagedBuffer {
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    pages: RwLock<Vec<PageEntry>>,
    frame_count: AtomicU64,
}

impl PagedBuffer {
    /// Create an empty buffer.
    ///
    /// `sample_rate` is the rate of the frames stored in the buffer, which for
    /// a converting stream is the engine rate rather than the source rate.
    pub fn new(format: SampleFormat, channels: u16, sample_rate: u32) -> Self {
        Self {
            format,
            channels,
            sample_rate,
            pages: RwLock::new(Vec::new()),
            frame_count: AtomicU64::new(0),
        }
    }

    /// Bytes per interleaved frame
    pub fn frame_size(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    /// Total frames appended so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Acquire)
    }

    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    /// Append a page and return the new total frame count.
    ///
    /// Empty pages are skipped.
    pub fn append(&self, page: Page) -> u64 {
        if page.frames() == 0 {
            return self.frame_count();
        }

        let frames = page.frames() as u64;
        let mut pages = self.pages.write();
        let start_frame = pages.last().map(PageEntry::end_frame).unwrap_or(0);
        pages.push(PageEntry {
            start_frame,
            page: Arc::new(page),
        });
        // Publish the frames only once the page is in the list
        self.frame_count.fetch_add(frames, Ordering::AcqRel) + frames
    }

    /// Copy raw frames starting at `start_frame` into `out`.
    ///
    /// Copies at most `out.len() / frame_size()` frames.
    ///
    /// # Returns
    /// Number of frames copied (0 when `start_frame` is at or past the end)
    pub fn read_range(&self, start_frame: u64, out: &mut [u8]) -> usize {
        let frame_size = self.frame_size();
        let max_frames = out.len() / frame_size;

        self.visit_range(start_frame, max_frames, |bytes, done| {
            let offset = done * frame_size;
            out[offset..offset + bytes.len()].copy_from_slice(bytes);
        })
    }

    /// Decode frames starting at `start_frame` into interleaved f32.
    ///
    /// Decodes at most `out.len() / channels` frames.
    pub fn read_frames_f32(&self, start_frame: u64, out: &mut [f32]) -> usize {
        let channels = self.channels as usize;
        let bytes_per_sample = self.format.bytes_per_sample();
        let max_frames = out.len() / channels;
        let format = self.format;

        self.visit_range(start_frame, max_frames, |bytes, done| {
            let dst = &mut out[done * channels..];
            for (sample, value) in bytes.chunks_exact(bytes_per_sample).zip(dst.iter_mut()) {
                *value = format.decode_sample(sample);
            }
        })
    }

    /// Walk the pages covering `[start_frame, start_frame + max_frames)`,
    /// handing each contiguous byte span to `visit` together with the number
    /// of frames already visited.
    fn visit_range<F>(&self, start_frame: u64, max_frames: usize, mut visit: F) -> usize
    where
        F: FnMut(&[u8], usize),
    {
        if max_frames == 0 {
            return 0;
        }

        let frame_size = self.frame_size();
        let pages = self.pages.read();
        let mut index = pages.partition_point(|entry| entry.end_frame() <= start_frame);
        let mut position = start_frame;
        let mut done = 0usize;

        while done < max_frames && index < pages.len() {
            let entry = &pages[index];
            let offset = (position - entry.start_frame) as usize;
            let take = (entry.page.frames() - offset).min(max_frames - done);
            let bytes = &entry.page.data()[offset * frame_size..(offset + take) * frame_size];

            visit(bytes, done);

            done += take;
            position += take as u64;
            index += 1;
        }

        done
    }
}

impl DataSource for PagedBuffer {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn length_frames(&self) -> u64 {
        self.frame_count()
    }

    fn read_frames(&self, start_frame: u64, out: &mut [f32]) -> usize {
        self.read_frames_f32(start_frame, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s16_stereo() -> PagedBuffer {
        PagedBuffer::new(SampleFormat::S16, 2, 44100)
    }

    fn frames_bytes(first: u8, frames: usize) -> Vec<u8> {
        (0..frames * 4).map(|i| first.wrapping_add(i as u8)).collect()
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = s16_stereo();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.page_count(), 0);
        assert_eq!(buffer.frame_size(), 4);

        let mut out = [0u8; 16];
        assert_eq!(buffer.read_range(0, &mut out), 0);
    }

    #[test]
    fn test_append_counts_frames() {
        let buffer = s16_stereo();
        assert_eq!(buffer.append(Page::new(frames_bytes(0, 10), 4)), 10);
        assert_eq!(buffer.append(Page::new(frames_bytes(0, 5), 4)), 15);
        assert_eq!(buffer.frame_count(), 15);
        assert_eq!(buffer.page_count(), 2);
    }

    #[test]
    fn test_partial_frame_is_dropped() {
        let page = Page::from_slice(&[1, 2, 3, 4, 5, 6], 4);
        assert_eq!(page.frames(), 1);
        assert_eq!(page.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_page_skipped() {
        let buffer = s16_stereo();
        buffer.append(Page::new(frames_bytes(0, 2), 4));
        assert_eq!(buffer.append(Page::new(vec![1, 2], 4)), 2);
        assert_eq!(buffer.page_count(), 1);
    }

    #[test]
    fn test_read_range_across_pages_is_byte_identical() {
        let buffer = s16_stereo();
        let first = frames_bytes(0, 3);
        let second = frames_bytes(100, 4);
        buffer.append(Page::new(first.clone(), 4));
        buffer.append(Page::new(second.clone(), 4));

        let mut all = vec![0u8; 7 * 4];
        assert_eq!(buffer.read_range(0, &mut all), 7);
        let expected: Vec<u8> = first.iter().chain(second.iter()).copied().collect();
        assert_eq!(all, expected);

        // Start in the middle of the first page, end in the second
        let mut window = vec![0u8; 3 * 4];
        assert_eq!(buffer.read_range(2, &mut window), 3);
        assert_eq!(&window[..], &expected[2 * 4..5 * 4]);
    }

    #[test]
    fn test_read_range_past_end() {
        let buffer = s16_stereo();
        buffer.append(Page::new(frames_bytes(0, 3), 4));

        let mut out = vec![0u8; 10 * 4];
        assert_eq!(buffer.read_range(1, &mut out), 2);
        assert_eq!(buffer.read_range(3, &mut out), 0);
        assert_eq!(buffer.read_range(99, &mut out), 0);
    }

    #[test]
    fn test_read_frames_f32_decodes() {
        let buffer = s16_stereo();
        let data: Vec<u8> = [16384i16, -16384, 0, 8192]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        buffer.append(Page::new(data, 4));

        let mut out = [0f32; 4];
        assert_eq!(buffer.read_frames(0, &mut out), 2);
        assert_eq!(out, [0.5, -0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_concurrent_append_and_read() {
        let buffer = Arc::new(s16_stereo());
        let reader = Arc::clone(&buffer);

        let handle = std::thread::spawn(move || {
            let mut out = vec![0u8; 64 * 4];
            let mut last = 0;
            for _ in 0..1000 {
                let count = reader.frame_count();
                assert!(count >= last, "frame count went backwards");
                last = count;
                let read = reader.read_range(0, &mut out);
                assert!(read as u64 <= 64.min(reader.frame_count()));
            }
        });

        for _ in 0..200 {
            buffer.append(Page::new(frames_bytes(0, 8), 4));
        }
        handle.join().unwrap();
        assert_eq!(buffer.frame_count(), 1600);
    }
}
