/// Held-Karp over `k` waypoints.
///
/// `to_goal[j]` is the distance from waypoint `j` to the goal and
/// `distances[j][i]` the distance between waypoints `j` and `i`. Entry
/// `[mask][j]` of the result is the cheapest walk that starts at `j`, visits
/// every waypoint in `mask` and ends at the goal; `usize::MAX` when `j` is not
/// in `mask`.
///
/// Exponential in `k`; callers cache the result per waypoint subset.
pub(crate) fn held_karp(to_goal: &[usize], distances: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let k = to_goal.len();
    let mut costs = vec![vec![usize::MAX; k]; 1 << k];

    for mask in 1usize..(1 << k) {
        for j in 0..k {
            if mask & (1 << j) == 0 {
                continue;
            }

            let rest = mask & !(1 << j);
            costs[mask][j] = if rest == 0 {
                to_goal[j]
            } else {
                // `rest < mask`, so its row is already final.
                (0..k)
                    .filter(|&i| rest & (1 << i) != 0)
                    .map(|i| distances[j][i].saturating_add(costs[rest][i]))
                    .min()
                    .unwrap_or(usize::MAX)
            };
        }
    }

    costs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_waypoint() {
        let costs = held_karp(&[5], &[vec![0]]);
        assert_eq!(costs, vec![vec![usize::MAX], vec![5]]);
    }

    #[test]
    fn test_order_matters() {
        // Waypoint 0 is next to the goal, waypoint 1 is far from it.
        let to_goal = [1, 10];
        let distances = vec![vec![0, 4], vec![4, 0]];
        let costs = held_karp(&to_goal, &distances);

        assert_eq!(costs[0b01][0], 1);
        assert_eq!(costs[0b10][1], 10);
        assert_eq!(costs[0b11][1], 4 + 1);
        assert_eq!(costs[0b11][0], 4 + 10);
        assert_eq!(costs[0b01][1], usize::MAX);
    }

    #[test]
    fn test_three_waypoints() {
        let to_goal = [3, 1, 2];
        let distances = vec![vec![0, 2, 6], vec![2, 0, 3], vec![6, 3, 0]];
        let costs = held_karp(&to_goal, &distances);

        // 0 -> 2 -> 1 -> goal = 6 + 3 + 1, 0 -> 1 -> 2 -> goal = 2 + 3 + 2.
        assert_eq!(costs[0b111][0], 7);
        // 2 -> 0 -> 1 -> goal = 6 + 2 + 1, 2 -> 1 -> 0 -> goal = 3 + 2 + 3.
        assert_eq!(costs[0b111][2], 8);
    }
}
