use crate::core::wire::ortb::OrtbBid;

/// Picks a seat's winning candidate.
///
/// Folds from a zero price sentinel and only replaces the running
/// winner on a strictly greater price, so the first candidate seen
/// at the top price wins and a seat with nothing above zero has no
/// winner.
pub fn arbitrate(candidates: &[OrtbBid]) -> Option<&OrtbBid> {
    candidates
        .iter()
        .fold((0.0_f64, None), |(best, winner), bid| {
            let price = bid.price();
            if price > best {
                (price, Some(bid))
            } else {
                (best, winner)
            }
        })
        .1
}
