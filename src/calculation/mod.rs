//! Calculation logic for the payroll engine.
//!
//! This module contains the pure pay calculations: the shared money rounding
//! policy, the monthly bonus from a bonus policy, the loss-of-pay deduction for
//! approved unpaid leave, and the composition of those into one pay item.

mod bonus;
mod loss_of_pay;
mod pay_item;
mod rounding;

pub use bonus::{BonusResult, calculate_bonus};
pub use loss_of_pay::{LossOfPayResult, calculate_loss_of_pay};
pub use pay_item::{PayItemCalculation, calculate_pay_item};
pub use rounding::{
    MONEY_SCALE, MONTHS_PER_YEAR, divide_money, monthly_base, multiply_money, round_money,
};
