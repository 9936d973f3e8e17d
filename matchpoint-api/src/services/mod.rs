pub mod audit;
pub mod badges;
pub mod compatibility;
pub mod completeness;
pub mod gateway;
pub mod limits;
pub mod products;
pub mod referral;
pub mod settlement;
