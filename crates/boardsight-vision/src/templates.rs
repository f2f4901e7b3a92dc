//! Piece Templates: 13 gray reference patches, one per occupant.

use boardsight_core::{
    BoardRegion, GrayImage, ImageError as PixelError, Occupant, OccupantTable, RgbImageView,
    SquareIndex,
};
use log::info;
use std::path::{Path, PathBuf};

/// Where each template is cut from a capture of the standard starting
/// position, as `(occupant, file, rank)` in [`Occupant::ALL`] order.
pub const BOOTSTRAP_SQUARES: [(Occupant, usize, usize); 13] = {
    use boardsight_core::{Color::*, PieceKind::*};
    [
        (Occupant::Empty, 0, 3),
        (Occupant::piece(White, King), 4, 0),
        (Occupant::piece(White, Queen), 3, 0),
        (Occupant::piece(White, Rook), 0, 0),
        (Occupant::piece(White, Bishop), 2, 0),
        (Occupant::piece(White, Knight), 1, 0),
        (Occupant::piece(White, Pawn), 0, 1),
        (Occupant::piece(Black, King), 4, 7),
        (Occupant::piece(Black, Queen), 3, 7),
        (Occupant::piece(Black, Rook), 0, 7),
        (Occupant::piece(Black, Bishop), 2, 7),
        (Occupant::piece(Black, Knight), 1, 7),
        (Occupant::piece(Black, Pawn), 0, 6),
    ]
};

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("missing templates in {}: {}", dir.display(), missing.join(", "))]
    Missing { dir: PathBuf, missing: Vec<String> },

    #[error("template path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode template {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode template {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Pixels(#[from] PixelError),
}

/// Immutable reference patches keyed by occupant. Lookups cannot miss.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateSet {
    table: OccupantTable<GrayImage>,
}

impl TemplateSet {
    pub fn new(table: OccupantTable<GrayImage>) -> Self {
        Self { table }
    }

    #[inline]
    pub fn get(&self, occupant: Occupant) -> &GrayImage {
        &self.table[occupant]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Occupant, &GrayImage)> {
        self.table.iter()
    }

    /// Storage file name for `occupant`, e.g. `white_king.png`.
    pub fn file_name(occupant: Occupant) -> String {
        format!("{}.png", occupant.key())
    }

    /// Load all 13 templates from `dir`. Every missing file is reported at once.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::NotADirectory(dir.to_path_buf()));
        }

        let missing: Vec<String> = Occupant::ALL
            .into_iter()
            .map(Self::file_name)
            .filter(|name| !dir.join(name).is_file())
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::Missing {
                dir: dir.to_path_buf(),
                missing,
            });
        }

        let table = OccupantTable::try_from_fn(|occ| {
            let path = dir.join(Self::file_name(occ));
            let img = image::open(&path)
                .map_err(|source| TemplateError::Decode {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            let (width, height) = (img.width() as usize, img.height() as usize);
            Ok::<_, TemplateError>(GrayImage {
                width,
                height,
                data: img.into_raw(),
            })
        })?;

        info!("loaded 13 templates from {}", dir.display());
        Ok(Self { table })
    }

    /// Write the 13 templates as 8-bit gray PNGs, creating `dir` if needed.
    pub fn save_dir(&self, dir: impl AsRef<Path>) -> Result<(), TemplateError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for (occ, tpl) in self.table.iter() {
            let path = dir.join(Self::file_name(occ));
            let buf = image::GrayImage::from_raw(tpl.width as u32, tpl.height as u32, tpl.data.clone())
                .ok_or(PixelError::InvalidBuffer {
                    expected: tpl.width * tpl.height,
                    got: tpl.data.len(),
                })?;
            buf.save_with_format(&path, image::ImageFormat::Png)
                .map_err(|source| TemplateError::Encode { path, source })?;
        }
        info!("saved 13 templates to {}", dir.display());
        Ok(())
    }

    /// Cut the templates out of a capture showing the standard starting
    /// position inside `region`.
    pub fn bootstrap_from_start(
        capture: &RgbImageView<'_>,
        region: &BoardRegion,
    ) -> Result<Self, TemplateError> {
        let table = OccupantTable::try_from_fn(|occ| {
            let (_, file, rank) = BOOTSTRAP_SQUARES[occ.index()];
            let square = SquareIndex::from_coords(file, rank).ok_or(PixelError::OutOfBounds {
                region: *region,
                width: capture.width,
                height: capture.height,
            })?;
            let patch = capture.crop(&region.square_rect(square))?;
            Ok::<_, TemplateError>(patch.view().to_gray())
        })?;
        Ok(Self { table })
    }
}
