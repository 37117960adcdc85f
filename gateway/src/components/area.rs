use protocol::Area;

/// Registry key of an emulated area. The index only matters for data
/// blocks and is forced to zero for every other area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaKey {
    pub area: Area,
    pub index: u16,
}

impl AreaKey {
    pub fn new(area: Area, index: u16) -> Self {
        let index = if area.is_indexed() { index } else { 0 };
        Self { area, index }
    }
}
