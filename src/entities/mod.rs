// Entity Models - the four daily reference tables
//
// Each entity:
// - parses itself from one tab-delimited row (RecordParser)
// - maps itself to and from its base table (TableRecord)
// - carries the run timestamp shared by every row of a load

pub mod product;
pub mod adjustment;
pub mod rate;
pub mod region;

pub use product::Product;
pub use adjustment::Adjustment;
pub use rate::Rate;
pub use region::Region;
