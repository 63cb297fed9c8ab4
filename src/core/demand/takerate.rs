/// Net price after withholding `take_rate` percent of a gross
/// endpoint price. A zero rate leaves the price untouched.
///
/// # Example
/// A gross cpm of 2.00 at a 10% take rate nets 1.80
pub fn markdown_bid(gross_price: f64, take_rate: u32) -> f64 {
    if take_rate == 0 {
        return gross_price;
    }

    gross_price * (1.0 - take_rate as f64 / 100.0)
}
