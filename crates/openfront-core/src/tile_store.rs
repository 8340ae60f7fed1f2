use std::collections::HashSet;

use openfront_protocol::{FnvBuildHasher, TerrainType, TileRef};
use thiserror::Error;

/// Deterministically hashed tile set; iteration order depends only on the
/// sequence of inserts and removes, never on process state.
pub type TileSet = HashSet<TileRef, FnvBuildHasher>;

// Terrain byte layout.
pub const IS_LAND_BIT: u8 = 7;
pub const SHORELINE_BIT: u8 = 6;
pub const OCEAN_BIT: u8 = 5;
pub const MAGNITUDE_MASK: u8 = 0x1f;

// State word layout.
pub const PLAYER_ID_MASK: u16 = 0x0fff;
pub const FALLOUT_BIT: u16 = 13;
pub const DEFENSE_BONUS_BIT: u16 = 14;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("map dimensions must be non-zero (got {width}x{height})")]
    EmptyMap { width: u32, height: u32 },
    #[error("terrain has {actual} bytes, expected {expected} for {width}x{height}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown terrain character {ch:?} at row {row}, column {col}")]
    UnknownGlyph { ch: char, row: usize, col: usize },
}

/// Packs one immutable terrain byte.
pub const fn terrain_byte(land: bool, shoreline: bool, ocean: bool, magnitude: u8) -> u8 {
    ((land as u8) << IS_LAND_BIT)
        | ((shoreline as u8) << SHORELINE_BIT)
        | ((ocean as u8) << OCEAN_BIT)
        | (magnitude & MAGNITUDE_MASK)
}

/// Flat, row-major tile arrays: one immutable terrain byte and one mutable
/// state word per tile.
#[derive(Clone, Debug)]
pub struct TileStore {
    width: u32,
    height: u32,
    terrain: Vec<u8>,
    state: Vec<u16>,
    num_land_tiles: u32,
    num_fallout_tiles: u32,
}

impl TileStore {
    pub fn from_terrain(width: u32, height: u32, terrain: Vec<u8>) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptyMap { width, height });
        }
        let expected = width as usize * height as usize;
        if terrain.len() != expected {
            return Err(TerrainError::LengthMismatch {
                width,
                height,
                expected,
                actual: terrain.len(),
            });
        }
        let num_land_tiles = terrain
            .iter()
            .filter(|&&b| b & (1 << IS_LAND_BIT) != 0)
            .count() as u32;
        Ok(Self {
            width,
            height,
            state: vec![0; expected],
            terrain,
            num_land_tiles,
            num_fallout_tiles: 0,
        })
    }

    /// Builds a map from a text grid: `.` ocean, `~` lake, `#` plains,
    /// `^` highland, `M` mountain. Shoreline flags are derived.
    pub fn from_ascii(text: &str) -> Result<Self, TerrainError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptyMap {
                width: width as u32,
                height: height as u32,
            });
        }

        // (land, ocean, magnitude) per tile, shoreline filled in afterwards.
        let mut cells = Vec::with_capacity(width * height);
        for (row, line) in rows.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(TerrainError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => (false, true, 0),
                    '~' => (false, false, 0),
                    '#' => (true, false, 2),
                    '^' => (true, false, 12),
                    'M' => (true, false, 25),
                    _ => return Err(TerrainError::UnknownGlyph { ch, row, col }),
                };
                cells.push(cell);
            }
        }

        let mut store = Self::from_terrain(
            width as u32,
            height as u32,
            cells
                .iter()
                .map(|&(land, ocean, mag)| terrain_byte(land, false, ocean, mag))
                .collect(),
        )?;
        for tile in 0..store.num_tiles() {
            let land = store.is_land(tile);
            let shoreline = store.neighbors(tile).any(|n| store.is_land(n) != land);
            if shoreline {
                store.terrain[tile as usize] |= 1 << SHORELINE_BIT;
            }
        }
        Ok(store)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn num_tiles(&self) -> u32 {
        self.width * self.height
    }

    pub fn num_land_tiles(&self) -> u32 {
        self.num_land_tiles
    }

    pub fn num_fallout_tiles(&self) -> u32 {
        self.num_fallout_tiles
    }

    pub fn is_valid_ref(&self, tile: TileRef) -> bool {
        (tile as usize) < self.terrain.len()
    }

    /// Signed so callers can test offsets that step off the map.
    pub fn is_valid_coord(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Panics on an out-of-bounds coordinate.
    pub fn ref_at(&self, x: u32, y: u32) -> TileRef {
        assert!(
            self.is_valid_coord(i64::from(x), i64::from(y)),
            "invalid coordinate ({x}, {y}) for {}x{} map",
            self.width,
            self.height
        );
        y * self.width + x
    }

    #[inline]
    pub fn x(&self, tile: TileRef) -> u32 {
        tile % self.width
    }

    #[inline]
    pub fn y(&self, tile: TileRef) -> u32 {
        tile / self.width
    }

    // --- terrain (read-only) ---

    #[inline]
    fn terrain_bit(&self, tile: TileRef, bit: u8) -> bool {
        self.terrain[tile as usize] & (1 << bit) != 0
    }

    pub fn is_land(&self, tile: TileRef) -> bool {
        self.terrain_bit(tile, IS_LAND_BIT)
    }

    pub fn is_water(&self, tile: TileRef) -> bool {
        !self.is_land(tile)
    }

    pub fn is_ocean(&self, tile: TileRef) -> bool {
        self.terrain_bit(tile, OCEAN_BIT)
    }

    pub fn is_lake(&self, tile: TileRef) -> bool {
        !self.is_land(tile) && !self.is_ocean(tile)
    }

    pub fn is_shoreline(&self, tile: TileRef) -> bool {
        self.terrain_bit(tile, SHORELINE_BIT)
    }

    /// Land tile touching water.
    pub fn is_shore(&self, tile: TileRef) -> bool {
        self.is_land(tile) && self.is_shoreline(tile)
    }

    /// Water tile touching land.
    pub fn is_shoreline_water(&self, tile: TileRef) -> bool {
        self.is_water(tile) && self.is_shoreline(tile)
    }

    pub fn magnitude(&self, tile: TileRef) -> u8 {
        self.terrain[tile as usize] & MAGNITUDE_MASK
    }

    pub fn terrain_type(&self, tile: TileRef) -> TerrainType {
        if self.is_land(tile) {
            match self.magnitude(tile) {
                0..=9 => TerrainType::Plains,
                10..=19 => TerrainType::Highland,
                _ => TerrainType::Mountain,
            }
        } else if self.is_ocean(tile) {
            TerrainType::Ocean
        } else {
            TerrainType::Lake
        }
    }

    // --- mutable state word ---

    pub fn owner_id(&self, tile: TileRef) -> u16 {
        self.state[tile as usize] & PLAYER_ID_MASK
    }

    pub fn has_owner(&self, tile: TileRef) -> bool {
        self.owner_id(tile) != 0
    }

    /// Panics if `owner` does not fit the 12-bit owner field.
    pub fn set_owner_id(&mut self, tile: TileRef, owner: u16) {
        assert!(
            owner <= PLAYER_ID_MASK,
            "owner id {owner} exceeds the {PLAYER_ID_MASK:#x} tile field capacity"
        );
        let word = &mut self.state[tile as usize];
        *word = (*word & !PLAYER_ID_MASK) | owner;
    }

    pub fn has_fallout(&self, tile: TileRef) -> bool {
        self.state[tile as usize] & (1 << FALLOUT_BIT) != 0
    }

    pub fn set_fallout(&mut self, tile: TileRef, value: bool) {
        if self.has_fallout(tile) == value {
            return;
        }
        let word = &mut self.state[tile as usize];
        if value {
            *word |= 1 << FALLOUT_BIT;
            self.num_fallout_tiles += 1;
        } else {
            *word &= !(1 << FALLOUT_BIT);
            self.num_fallout_tiles -= 1;
        }
    }

    pub fn has_defense_bonus(&self, tile: TileRef) -> bool {
        self.state[tile as usize] & (1 << DEFENSE_BONUS_BIT) != 0
    }

    pub fn set_defense_bonus(&mut self, tile: TileRef, value: bool) {
        let word = &mut self.state[tile as usize];
        if value {
            *word |= 1 << DEFENSE_BONUS_BIT;
        } else {
            *word &= !(1 << DEFENSE_BONUS_BIT);
        }
    }

    // --- wire packing ---

    /// `ref << 16 | state word`.
    pub fn to_tile_update(&self, tile: TileRef) -> u64 {
        (u64::from(tile) << 16) | u64::from(self.state[tile as usize])
    }

    /// Writes the packed state word back and returns the tile it addressed.
    /// Panics when the packed ref lies outside the map.
    pub fn update_tile(&mut self, packed: u64) -> TileRef {
        let tile = (packed >> 16) as TileRef;
        assert!(
            (packed >> 16) == u64::from(tile) && self.is_valid_ref(tile),
            "tile update {packed:#x} addresses ref {} outside the {}x{} map",
            packed >> 16,
            self.width,
            self.height
        );
        let word = (packed & 0xffff) as u16;
        let had_fallout = self.has_fallout(tile);
        self.state[tile as usize] = word;
        match (had_fallout, self.has_fallout(tile)) {
            (false, true) => self.num_fallout_tiles += 1,
            (true, false) => self.num_fallout_tiles -= 1,
            _ => {}
        }
        tile
    }

    // --- geometry ---

    /// Up, down, left, right; clipped at the map edges.
    pub fn neighbors(&self, tile: TileRef) -> impl Iterator<Item = TileRef> {
        let w = self.width;
        let x = self.x(tile);
        let up = (tile >= w).then(|| tile - w);
        let down = (tile < (self.height - 1) * w).then(|| tile + w);
        let left = (x != 0).then(|| tile - 1);
        let right = (x != w - 1).then(|| tile + 1);
        [up, down, left, right].into_iter().flatten()
    }

    pub fn manhattan_dist(&self, a: TileRef, b: TileRef) -> u32 {
        self.x(a).abs_diff(self.x(b)) + self.y(a).abs_diff(self.y(b))
    }

    pub fn euclidean_dist_squared(&self, a: TileRef, b: TileRef) -> u64 {
        let dx = u64::from(self.x(a).abs_diff(self.x(b)));
        let dy = u64::from(self.y(a).abs_diff(self.y(b)));
        dx * dx + dy * dy
    }

    /// Stack-based flood fill from `start` through tiles accepted by
    /// `filter`. Returns nothing if `start` itself is rejected.
    pub fn bfs<F>(&self, start: TileRef, mut filter: F) -> TileSet
    where
        F: FnMut(&TileStore, TileRef) -> bool,
    {
        let mut seen = TileSet::default();
        let mut stack = Vec::new();
        if filter(self, start) {
            seen.insert(start);
            stack.push(start);
        }
        while let Some(current) = stack.pop() {
            for n in self.neighbors(current) {
                if !seen.contains(&n) && filter(self, n) {
                    seen.insert(n);
                    stack.push(n);
                }
            }
        }
        seen
    }

    /// Connected tiles within euclidean `radius` of `center` that also pass
    /// `filter`.
    pub fn circle_search<F>(&self, center: TileRef, radius: u32, mut filter: F) -> TileSet
    where
        F: FnMut(&TileStore, TileRef) -> bool,
    {
        let r2 = u64::from(radius) * u64::from(radius);
        self.bfs(center, |map, t| {
            map.euclidean_dist_squared(center, t) <= r2 && filter(map, t)
        })
    }
}
