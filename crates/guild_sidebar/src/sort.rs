//! Ordering of a flat guild list by the account's stored guild positions.
//!
//! The comparator is inherited from older clients and is not a strict weak
//! order: it walks the position list once, and `a` precedes `b` only when `b`
//! shows up somewhere after `a` has been seen. Guilds missing from the list
//! never precede anything, yet a listed guild does not precede them either,
//! so the relation is not transitive. Results depend on the exact sequence of
//! comparisons, which is why this module carries its own stable sort instead
//! of `slice::sort_by` (that one is free to compare in any order and may
//! panic on an inconsistent comparator).

use shared::{domain::GuildId, protocol::GuildSnapshot};

const INSERTION_BLOCK: usize = 20;

/// Legacy "less than" over guild IDs.
pub fn precedes(positions: &[GuildId], a: GuildId, b: GuildId) -> bool {
    let mut found = false;
    for &guild_id in positions {
        if found && guild_id == b {
            return true;
        }
        if !found && guild_id == a {
            found = true;
        }
    }
    false
}

/// Sorts `guilds` in place by `positions` using [`precedes`]. An empty
/// position list leaves the input untouched.
pub fn sort_by_positions(guilds: &mut [GuildSnapshot], positions: &[GuildId]) {
    if positions.is_empty() {
        return;
    }
    stable_sort(guilds, |a, b| precedes(positions, a.guild_id, b.guild_id));
}

/// Block insertion sort followed by in-place symmetric merges. Only ever
/// asks `less(x, y)` and never reorders elements it did not find out of
/// order, so it stays stable under any comparator.
pub fn stable_sort<T, F>(items: &mut [T], mut less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    let n = items.len();
    let mut block = INSERTION_BLOCK;

    let (mut a, mut b) = (0, block);
    while b <= n {
        insertion_sort(items, a, b, &mut less);
        a = b;
        b += block;
    }
    insertion_sort(items, a, n, &mut less);

    while block < n {
        let (mut a, mut b) = (0, 2 * block);
        while b <= n {
            sym_merge(items, a, a + block, b, &mut less);
            a = b;
            b += 2 * block;
        }
        let m = a + block;
        if m < n {
            sym_merge(items, a, m, n, &mut less);
        }
        block *= 2;
    }
}

fn insertion_sort<T, F>(items: &mut [T], a: usize, b: usize, less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    for i in a + 1..b {
        let mut j = i;
        while j > a && less(&items[j], &items[j - 1]) {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Merges the sorted runs `items[a..m]` and `items[m..b]`.
fn sym_merge<T, F>(items: &mut [T], a: usize, m: usize, b: usize, less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if m - a == 1 {
        // Single element on the left: binary search its slot on the right.
        let (mut i, mut j) = (m, b);
        while i < j {
            let h = (i + j) / 2;
            if less(&items[h], &items[a]) {
                i = h + 1;
            } else {
                j = h;
            }
        }
        items[a..i].rotate_left(1);
        return;
    }

    if b - m == 1 {
        let (mut i, mut j) = (a, m);
        while i < j {
            let h = (i + j) / 2;
            if !less(&items[m], &items[h]) {
                i = h + 1;
            } else {
                j = h;
            }
        }
        items[i..=m].rotate_right(1);
        return;
    }

    let mid = (a + b) / 2;
    let n = mid + m;
    let (mut start, mut r) = if m > mid { (n - b, mid) } else { (a, m) };
    let p = n - 1;
    while start < r {
        let c = (start + r) / 2;
        if !less(&items[p - c], &items[c]) {
            start = c + 1;
        } else {
            r = c;
        }
    }

    let end = n - start;
    if start < m && m < end {
        items[start..end].rotate_left(m - start);
    }
    if a < start && start < mid {
        sym_merge(items, a, start, mid, less);
    }
    if mid < end && end < b {
        sym_merge(items, mid, end, b, less);
    }
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
