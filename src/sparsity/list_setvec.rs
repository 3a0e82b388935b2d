//! Vector of sets as reference-counted sorted linked lists in one arena.
//!
//! All lists live in a single node arena. Node 0 is the shared terminator;
//! its value is `end`, so an iterator can stop on `value >= end` without a
//! separate emptiness check. A non-empty set `i` points at a header node
//! whose value is the list's reference count and whose `next` leads to the
//! first element node; element nodes are sorted ascending and the last one
//! points back at node 0. `assignment` between sets of the same vector just
//! bumps the reference count; any mutation of a shared list first
//! materializes a private copy. When a list's reference count reaches zero
//! its nodes go onto an internal free list and later allocations pop from
//! it; `number_not_used` exposes how many nodes are currently free.

use super::SetVec;

#[derive(Debug, Clone, Copy)]
struct Node {
    value: usize,
    next: usize,
}

#[derive(Debug, Clone)]
pub struct ListSetVec {
    end: usize,
    data: Vec<Node>,
    /// Header node per set; 0 means empty.
    start: Vec<usize>,
    /// Head of the posted-element list per set; 0 means none.
    post: Vec<usize>,
    /// Head of the free list; 0 means empty.
    free: usize,
    /// Number of nodes on the free list.
    data_not_used: usize,
}

impl ListSetVec {
    /// Nodes currently on the free list.
    pub fn number_not_used(&self) -> usize {
        self.data_not_used
    }

    /// Dump every non-empty set to standard output, one line per set.
    pub fn print(&self) {
        for i in 0..self.start.len() {
            if self.start[i] != 0 {
                println!("set[{}] = {:?}", i, self.collect(i));
            }
        }
    }

    /// Reference count of set `i`'s list (0 for the empty set).
    pub fn reference_count(&self, i: usize) -> usize {
        let h = self.start[i];
        if h == 0 {
            0
        } else {
            self.data[h].value
        }
    }

    fn new_node(&mut self, value: usize, next: usize) -> usize {
        if self.free != 0 {
            let idx = self.free;
            self.free = self.data[idx].next;
            self.data[idx] = Node { value, next };
            self.data_not_used -= 1;
            return idx;
        }
        self.data.push(Node { value, next });
        self.data.len() - 1
    }

    /// Splice the chain headed at `head` (terminated by node 0) onto the
    /// free list.
    fn free_chain(&mut self, head: usize) {
        if head == 0 {
            return;
        }
        let mut count = 1;
        let mut tail = head;
        while self.data[tail].next != 0 {
            count += 1;
            tail = self.data[tail].next;
        }
        self.data[tail].next = self.free;
        self.free = head;
        self.data_not_used += count;
    }

    /// Detach set `i` from its list, freeing the nodes if this was the
    /// last reference.
    fn drop_list(&mut self, i: usize) {
        let header = self.start[i];
        if header == 0 {
            return;
        }
        self.start[i] = 0;
        self.data[header].value -= 1;
        if self.data[header].value == 0 {
            self.free_chain(header);
        }
    }

    /// Build a fresh private list (reference count 1) from sorted `elems`
    /// and attach it to set `i`. The previous list must already be dropped.
    fn build_list(&mut self, i: usize, elems: &[usize]) {
        debug_assert_eq!(self.start[i], 0);
        if elems.is_empty() {
            return;
        }
        let header = self.new_node(1, 0);
        let mut prev = header;
        for &e in elems {
            let node = self.new_node(e, 0);
            self.data[prev].next = node;
            prev = node;
        }
        self.start[i] = header;
    }

    /// Sorted elements of set `i`.
    fn collect(&self, i: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut idx = match self.start[i] {
            0 => 0,
            h => self.data[h].next,
        };
        while idx != 0 {
            out.push(self.data[idx].value);
            idx = self.data[idx].next;
        }
        out
    }

    /// Give set `i` a private copy of its (shared) list.
    fn make_private(&mut self, i: usize) {
        let header = self.start[i];
        debug_assert!(header != 0 && self.data[header].value > 1);
        let elems = self.collect(i);
        self.data[header].value -= 1;
        self.start[i] = 0;
        self.build_list(i, &elems);
    }

    fn sorted_union(a: &[usize], b: &[usize]) -> Vec<usize> {
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        out
    }

    fn sorted_intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }
}

impl SetVec for ListSetVec {
    type Iter<'a> = ListSetVecIter<'a>;

    fn with_sets(n_set: usize, end: usize) -> Self {
        let mut v = ListSetVec {
            end: 0,
            data: Vec::new(),
            start: Vec::new(),
            post: Vec::new(),
            free: 0,
            data_not_used: 0,
        };
        v.resize(n_set, end);
        v
    }

    fn resize(&mut self, n_set: usize, end: usize) {
        self.end = end;
        self.data.clear();
        // Node 0 terminates every list and carries the end sentinel.
        self.data.push(Node {
            value: end,
            next: 0,
        });
        self.start.clear();
        self.start.resize(n_set, 0);
        self.post.clear();
        self.post.resize(n_set, 0);
        self.free = 0;
        self.data_not_used = 0;
    }

    fn n_set(&self) -> usize {
        self.start.len()
    }

    fn end(&self) -> usize {
        self.end
    }

    fn clear(&mut self, i: usize) {
        self.drop_list(i);
        let head = self.post[i];
        self.post[i] = 0;
        self.free_chain(head);
    }

    fn add_element(&mut self, i: usize, e: usize) {
        assert!(e < self.end, "element {} not below end {}", e, self.end);
        if self.start[i] == 0 {
            let elem = self.new_node(e, 0);
            let header = self.new_node(1, elem);
            self.start[i] = header;
            return;
        }
        if self.is_element(i, e) {
            return;
        }
        if self.data[self.start[i]].value > 1 {
            self.make_private(i);
        }
        let header = self.start[i];
        let mut prev = header;
        let mut idx = self.data[prev].next;
        while idx != 0 && self.data[idx].value < e {
            prev = idx;
            idx = self.data[idx].next;
        }
        let node = self.new_node(e, idx);
        self.data[prev].next = node;
    }

    fn post_element(&mut self, i: usize, e: usize) {
        assert!(e < self.end, "element {} not below end {}", e, self.end);
        let node = self.new_node(e, self.post[i]);
        self.post[i] = node;
    }

    fn process_post(&mut self, i: usize) {
        if self.post[i] == 0 {
            return;
        }
        let mut posted = Vec::new();
        let mut idx = self.post[i];
        while idx != 0 {
            posted.push(self.data[idx].value);
            idx = self.data[idx].next;
        }
        let head = self.post[i];
        self.post[i] = 0;
        self.free_chain(head);
        posted.sort_unstable();
        posted.dedup();
        // Sharing survives when nothing new actually arrives.
        if posted.iter().all(|&e| self.is_element(i, e)) {
            return;
        }
        let merged = Self::sorted_union(&self.collect(i), &posted);
        self.drop_list(i);
        self.build_list(i, &merged);
    }

    fn is_element(&self, i: usize, e: usize) -> bool {
        let mut idx = match self.start[i] {
            0 => return false,
            h => self.data[h].next,
        };
        while idx != 0 {
            let v = self.data[idx].value;
            if v == e {
                return true;
            }
            if v > e {
                return false;
            }
            idx = self.data[idx].next;
        }
        false
    }

    fn number_elements(&self, i: usize) -> usize {
        let mut count = 0;
        let mut idx = match self.start[i] {
            0 => 0,
            h => self.data[h].next,
        };
        while idx != 0 {
            count += 1;
            idx = self.data[idx].next;
        }
        count
    }

    fn assignment(&mut self, target: usize, source: usize) {
        if target == source {
            return;
        }
        let src = self.start[source];
        if src != 0 {
            self.data[src].value += 1;
        }
        self.drop_list(target);
        self.start[target] = src;
    }

    fn assign_from(&mut self, target: usize, other: &Self, source: usize) {
        let elems = other.collect(source);
        self.drop_list(target);
        self.build_list(target, &elems);
    }

    fn binary_union(&mut self, target: usize, left: usize, right: usize) {
        debug_assert!(self.post[left] == 0 && self.post[right] == 0);
        let a = self.collect(left);
        let b = self.collect(right);
        // Subset cases keep sharing the bigger list.
        if b.iter().all(|e| a.binary_search(e).is_ok()) {
            self.assignment(target, left);
            return;
        }
        if a.iter().all(|e| b.binary_search(e).is_ok()) {
            self.assignment(target, right);
            return;
        }
        let merged = Self::sorted_union(&a, &b);
        self.drop_list(target);
        self.build_list(target, &merged);
    }

    fn union_from(&mut self, target: usize, left: usize, other: &Self, right: usize) {
        let a = self.collect(left);
        let b = other.collect(right);
        if b.iter().all(|e| a.binary_search(e).is_ok()) {
            self.assignment(target, left);
            return;
        }
        let merged = Self::sorted_union(&a, &b);
        self.drop_list(target);
        self.build_list(target, &merged);
    }

    fn binary_intersection(&mut self, target: usize, left: usize, right: usize) {
        debug_assert!(self.post[left] == 0 && self.post[right] == 0);
        let a = self.collect(left);
        let b = self.collect(right);
        let common = Self::sorted_intersection(&a, &b);
        if common.len() == a.len() {
            self.assignment(target, left);
            return;
        }
        if common.len() == b.len() {
            self.assignment(target, right);
            return;
        }
        self.drop_list(target);
        self.build_list(target, &common);
    }

    fn iter(&self, i: usize) -> ListSetVecIter<'_> {
        let next = match self.start[i] {
            0 => 0,
            h => self.data[h].next,
        };
        ListSetVecIter {
            data: &self.data,
            next,
            end: self.end,
        }
    }
}

/// Iterator over one set, in increasing element order.
///
/// [`ListSetVecIter::next_or_end`] mirrors the sentinel convention of the
/// underlying lists: it yields `end` once the set is exhausted.
pub struct ListSetVecIter<'a> {
    data: &'a [Node],
    next: usize,
    end: usize,
}

impl<'a> ListSetVecIter<'a> {
    /// Next element, or `end` when exhausted (repeatedly).
    pub fn next_or_end(&mut self) -> usize {
        let v = self.data[self.next].value;
        if v >= self.end {
            return self.end;
        }
        self.next = self.data[self.next].next;
        v
    }
}

impl<'a> Iterator for ListSetVecIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let v = self.data[self.next].value;
        if v >= self.end {
            return None;
        }
        self.next = self.data[self.next].next;
        Some(v)
    }
}
