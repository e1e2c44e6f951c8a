use super::{resolver, Favourite, FavouriteKind};
use crate::prefs::IconSize;
use lru::LruCache;
use once_cell::sync::Lazy;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CACHE_CAPACITY: usize = 256;
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const ICNS_MAGIC: &[u8] = b"icns";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Straight RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl IconImage {
    fn blank(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            rgba: vec![0; (size * size * 4) as usize],
        }
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 4]) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                let idx = ((y * self.width + x) * 4) as usize;
                self.rgba[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }
}

pub trait IconLookup {
    fn icon(&mut self, favourite: &Favourite, size: IconSize) -> Option<Arc<IconImage>>;
}

/// Lookup that never yields an icon.
pub struct NoIcons;

impl IconLookup for NoIcons {
    fn icon(&mut self, _favourite: &Favourite, _size: IconSize) -> Option<Arc<IconImage>> {
        None
    }
}

pub struct IconCache {
    entries: LruCache<(PathBuf, IconSize), Option<Arc<IconImage>>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn invalidate(&mut self, path: &Path) {
        for size in [IconSize::Small, IconSize::Big] {
            self.entries.pop(&(path.to_path_buf(), size));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IconLookup for IconCache {
    fn icon(&mut self, favourite: &Favourite, size: IconSize) -> Option<Arc<IconImage>> {
        let key = (favourite.path.clone(), size);
        if let Some(hit) = self.entries.get(&key) {
            return hit.clone();
        }

        let icon = lookup(favourite, size);
        if icon.is_none() {
            log::debug!("No icon for {}", favourite.path.display());
        }
        self.entries.put(key, icon.clone());
        icon
    }
}

pub fn lookup(favourite: &Favourite, size: IconSize) -> Option<Arc<IconImage>> {
    let px = size.pixels();
    match favourite.kind {
        FavouriteKind::Dir => thumbnail(&favourite.path, px),
        FavouriteKind::App => match find_bundle_icon(&favourite.path) {
            Some(icns) => thumbnail(&icns, px).or_else(|| Some(generic_file_icon(size))),
            None => Some(generic_file_icon(size)),
        },
        FavouriteKind::File if is_image(&favourite.path) => {
            thumbnail(&favourite.path, px).or_else(|| Some(generic_file_icon(size)))
        }
        FavouriteKind::File => Some(generic_file_icon(size)),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
}

/// Renders a square preview of `path` no larger than `px`.
pub fn thumbnail(path: &Path, px: u32) -> Option<Arc<IconImage>> {
    if resolver::is_dir(path) {
        return Some(Arc::new(draw_folder(px)));
    }

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::debug!("Failed to read {} for thumbnail: {}", path.display(), e);
            return None;
        }
    };

    let encoded = if data.starts_with(ICNS_MAGIC) {
        best_icns_png(&data, px)?
    } else {
        &data[..]
    };

    let decoded = match image::load_from_memory(encoded) {
        Ok(img) => img,
        Err(e) => {
            log::debug!("Failed to decode {}: {}", path.display(), e);
            return None;
        }
    };

    let rgba = decoded.thumbnail(px, px).to_rgba8();
    Some(Arc::new(IconImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }))
}

pub fn find_bundle_icon(app: &Path) -> Option<PathBuf> {
    let resources = app.join("Contents").join("Resources");
    let mut entries: Vec<PathBuf> = std::fs::read_dir(&resources)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "icns"))
        .collect();
    entries.sort();
    entries.into_iter().next()
}

/// Picks the PNG representation closest to `px`, preferring ones at least that large.
fn best_icns_png(data: &[u8], px: u32) -> Option<&[u8]> {
    if data.len() < 8 || !data.starts_with(ICNS_MAGIC) {
        return None;
    }

    let declared = read_be_u32(data, 4)? as usize;
    let total = declared.min(data.len());
    let mut offset = 8;
    let mut best: Option<(u32, &[u8])> = None;

    while offset + 8 <= total {
        let len = read_be_u32(data, offset + 4)? as usize;
        if len < 8 || offset + len > total {
            break;
        }

        let body = &data[offset + 8..offset + len];
        if let Some(width) = png_width(body) {
            let better = match best {
                None => true,
                Some((current, _)) => is_better_size(width, current, px),
            };
            if better {
                best = Some((width, body));
            }
        }
        offset += len;
    }

    best.map(|(_, body)| body)
}

fn is_better_size(candidate: u32, current: u32, px: u32) -> bool {
    match (candidate >= px, current >= px) {
        (true, true) => candidate < current,
        (true, false) => true,
        (false, true) => false,
        (false, false) => candidate > current,
    }
}

fn png_width(body: &[u8]) -> Option<u32> {
    if !body.starts_with(PNG_MAGIC) {
        return None;
    }
    read_be_u32(body, 16)
}

fn read_be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

static FILE_SMALL: Lazy<Arc<IconImage>> = Lazy::new(|| Arc::new(draw_file(IconSize::Small.pixels())));
static FILE_BIG: Lazy<Arc<IconImage>> = Lazy::new(|| Arc::new(draw_file(IconSize::Big.pixels())));

pub fn generic_file_icon(size: IconSize) -> Arc<IconImage> {
    match size {
        IconSize::Small => FILE_SMALL.clone(),
        IconSize::Big => FILE_BIG.clone(),
    }
}

fn draw_file(size: u32) -> IconImage {
    let mut img = IconImage::blank(size);
    let outline = [120, 120, 128, 255];
    let paper = [250, 250, 250, 255];
    let left = size / 6;
    let right = size - size / 6;
    let fold = size / 4;

    img.fill_rect(left, 0, right, size, outline);
    img.fill_rect(left + 1, 1, right - 1, size - 1, paper);
    img.fill_rect(right - fold, 0, right, fold, [0, 0, 0, 0]);
    img.fill_rect(right - fold, fold - 1, right, fold, outline);
    img.fill_rect(right - fold, 0, right - fold + 1, fold, outline);
    img
}

fn draw_folder(size: u32) -> IconImage {
    let mut img = IconImage::blank(size);
    let tab = [66, 146, 222, 255];
    let body = [94, 170, 240, 255];
    let top = size / 5;

    img.fill_rect(0, top, size / 2, top + size / 8, tab);
    img.fill_rect(0, top + size / 8, size, size - size / 8, body);
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn png_bytes(size: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(size, size, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn icns_with(sizes: &[u32]) -> Vec<u8> {
        let mut chunks = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let png = png_bytes(*size);
            chunks.extend_from_slice(format!("ic0{}", i + 7).as_bytes());
            chunks.extend_from_slice(&((png.len() + 8) as u32).to_be_bytes());
            chunks.extend_from_slice(&png);
        }
        let mut data = ICNS_MAGIC.to_vec();
        data.extend_from_slice(&((chunks.len() + 8) as u32).to_be_bytes());
        data.extend_from_slice(&chunks);
        data
    }

    fn favourite(path: &Path, kind: FavouriteKind) -> Favourite {
        Favourite {
            path: path.to_path_buf(),
            name: "x".into(),
            kind,
        }
    }

    #[test]
    fn is_better_size_cases() {
        let cases = [
            // (candidate, current, wanted, candidate_wins)
            (32, 64, 16, true),
            (64, 32, 16, false),
            (32, 8, 16, true),
            (8, 32, 16, false),
            (12, 8, 16, true),
            (8, 12, 16, false),
            (16, 32, 16, true),
        ];

        for (candidate, current, px, expected) in cases {
            assert_eq!(is_better_size(candidate, current, px), expected, "{} vs {} for {}", candidate, current, px);
        }
    }

    #[test]
    fn best_icns_png_prefers_smallest_sufficient_representation() {
        let data = icns_with(&[128, 32, 64]);

        let png = best_icns_png(&data, 16).unwrap();

        assert_eq!(png_width(png), Some(32));
    }

    #[test]
    fn best_icns_png_rejects_malformed_data() {
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            b"icns".to_vec(),
            b"nope\0\0\0\x10".to_vec(),
            [b"icns".as_slice(), &100u32.to_be_bytes(), b"ic07\0\0\0\x02"].concat(),
        ];

        for data in cases {
            assert!(best_icns_png(&data, 16).is_none(), "data: {:?}", data);
        }
    }

    #[test]
    fn thumbnail_scales_images_down() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.png");
        fs::write(&path, png_bytes(64)).unwrap();

        let icon = thumbnail(&path, 16).unwrap();

        assert_eq!((icon.width, icon.height), (16, 16));
        assert_eq!(icon.rgba.len(), 16 * 16 * 4);
    }

    #[test]
    fn thumbnail_failures_yield_none() {
        let temp = TempDir::new().unwrap();
        let garbage = temp.path().join("notes.txt");
        fs::write(&garbage, "not an image").unwrap();

        assert!(thumbnail(&garbage, 16).is_none());
        assert!(thumbnail(&temp.path().join("missing.png"), 16).is_none());
    }

    #[test]
    fn directories_render_a_folder_at_requested_size() {
        let temp = TempDir::new().unwrap();

        let icon = lookup(&favourite(temp.path(), FavouriteKind::Dir), IconSize::Big).unwrap();

        assert_eq!((icon.width, icon.height), (32, 32));
    }

    #[test]
    fn app_uses_bundle_icon_when_present() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("Tool.app");
        let resources = app.join("Contents").join("Resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join("Info.txt"), "x").unwrap();
        fs::write(resources.join("AppIcon.icns"), icns_with(&[64])).unwrap();

        let icon = lookup(&favourite(&app, FavouriteKind::App), IconSize::Small).unwrap();

        assert_eq!(find_bundle_icon(&app), Some(resources.join("AppIcon.icns")));
        assert_eq!((icon.width, icon.height), (16, 16));
        assert_ne!(icon, generic_file_icon(IconSize::Small));
    }

    #[test]
    fn app_without_bundle_icon_falls_back_to_generic() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("Bare.app");
        fs::create_dir_all(&app).unwrap();

        let icon = lookup(&favourite(&app, FavouriteKind::App), IconSize::Small).unwrap();

        assert_eq!(icon, generic_file_icon(IconSize::Small));
    }

    #[test]
    fn image_files_get_a_preview_and_others_the_generic_glyph() {
        let temp = TempDir::new().unwrap();
        let photo = temp.path().join("Photo.PNG");
        let broken = temp.path().join("broken.png");
        let notes = temp.path().join("notes.txt");
        fs::write(&photo, png_bytes(48)).unwrap();
        fs::write(&broken, "garbage").unwrap();
        fs::write(&notes, "hello").unwrap();

        let preview = lookup(&favourite(&photo, FavouriteKind::File), IconSize::Big).unwrap();

        assert_eq!((preview.width, preview.height), (32, 32));
        assert_ne!(preview, generic_file_icon(IconSize::Big));
        for path in [&broken, &notes] {
            let icon = lookup(&favourite(path, FavouriteKind::File), IconSize::Big).unwrap();
            assert_eq!(icon, generic_file_icon(IconSize::Big), "path: {}", path.display());
        }
    }

    #[test]
    fn cache_reuses_lookups_and_invalidates_per_path() {
        let temp = TempDir::new().unwrap();
        let fav = favourite(temp.path(), FavouriteKind::Dir);
        let mut cache = IconCache::with_capacity(4);

        let first = cache.icon(&fav, IconSize::Small).unwrap();
        let second = cache.icon(&fav, IconSize::Small).unwrap();
        cache.icon(&fav, IconSize::Big);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);

        cache.invalidate(temp.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let temp = TempDir::new().unwrap();
        let mut cache = IconCache::with_capacity(1);
        let a = favourite(&temp.path().join("a"), FavouriteKind::File);
        let b = favourite(&temp.path().join("b"), FavouriteKind::File);

        cache.icon(&a, IconSize::Small);
        cache.icon(&b, IconSize::Small);

        assert_eq!(cache.len(), 1);
    }
}
