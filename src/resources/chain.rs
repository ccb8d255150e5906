//! Ordered sequences of resource blocks.
//!
//! Both IP address and AS number resources are handled as blocks of
//! consecutive items described by their smallest and largest item. The
//! trait [`Block`] abstracts over the concrete representations.
//!
//! A sequence of ordered, non-overlapping and non-adjacent blocks is called
//! a chain. It is provided by [`Chain`] which keeps the blocks in a vector
//! and makes sure they are always normalized. All the set operations on
//! resources are implemented on chains.

use std::{iter, slice};
use std::cmp::{max, min};


//------------ Block ---------------------------------------------------------

pub trait Block: Clone {
    type Item: Copy + Eq + Ord;

    /// Creates a new block from the minimum and maximum.
    fn new(min: Self::Item, max: Self::Item) -> Self;

    /// Returns the smallest item that is part of the block.
    fn min(&self) -> Self::Item;

    /// Returns the largest item that is part of the block.
    fn max(&self) -> Self::Item;

    /// Returns the item immediately following the given item.
    fn next(item: Self::Item) -> Option<Self::Item>;

    /// Returns the item immediately preceding the given item.
    fn previous(item: Self::Item) -> Option<Self::Item>;

    /// Returns a pair of the smallest and largest item in the block.
    fn bounds(&self) -> (Self::Item, Self::Item) {
        (self.min(), self.max())
    }

    /// Returns whether an item is part of the block.
    fn contains(&self, item: Self::Item) -> bool {
        self.min() <= item && self.max() >= item
    }

    /// Returns whether a block intersects with another block.
    fn intersects(&self, other: &Self) -> bool {
        self.min() <= other.max() && self.max() >= other.min()
    }

    /// Returns whether a block is encompassed by another block.
    fn is_encompassed(&self, other: &Self) -> bool {
        other.min() <= self.min() && other.max() >= self.max()
    }

    /// Returns the sum of two blocks if they overlap or are adjacent.
    fn sum(&self, other: &Self) -> Option<Self> {
        if self.intersects(other) {
            Some(Self::new(
                min(self.min(), other.min()),
                max(self.max(), other.max())
            ))
        }
        else if Self::next(self.max()) == Some(other.min()) {
            Some(Self::new(self.min(), other.max()))
        }
        else if Self::next(other.max()) == Some(self.min()) {
            Some(Self::new(other.min(), self.max()))
        }
        else {
            None
        }
    }
}


//------------ Chain ---------------------------------------------------------

/// An ordered, non-overlapping, non-continuous sequence of blocks.
#[derive(Clone, Debug)]
pub struct Chain<T: Block>(Vec<T>);

impl<T: Block> Chain<T> {
    /// Creates an empty chain.
    pub fn empty() -> Self {
        Chain(Vec::new())
    }

    /// Creates a chain containing exactly one block.
    pub fn single(block: T) -> Self {
        Chain(vec![block])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn iter(&self) -> slice::Iter<T> {
        self.0.iter()
    }

    /// Returns whether the chain contains the given item.
    pub fn contains_item(&self, item: T::Item) -> bool {
        self.0.iter().any(|block| block.contains(item))
    }

    /// Returns whether the chain intersects with the given block.
    pub fn intersects_block(&self, block: &T) -> bool {
        self.0.iter().any(|item| item.intersects(block))
    }

    /// Checks whether `self` is encompassed by `other`.
    ///
    /// Each block of `self` needs to be fully covered by one block of
    /// `other`. Because chains never contain adjacent blocks, one block
    /// can’t be covered by more than one block.
    pub fn is_encompassed(&self, other: &Self) -> bool {
        let mut other = other.0.iter().peekable();
        for block in &self.0 {
            loop {
                match other.peek() {
                    Some(item) if item.max() < block.min() => {
                        other.next();
                    }
                    Some(item) => {
                        if !block.is_encompassed(item) {
                            return false
                        }
                        break
                    }
                    None => return false
                }
            }
        }
        true
    }

    /// Returns a new chain with all items that are in both chains.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut res = Vec::new();
        let (mut left, mut right) = (0, 0);
        while left < self.0.len() && right < other.0.len() {
            let (lmin, lmax) = self.0[left].bounds();
            let (rmin, rmax) = other.0[right].bounds();
            let start = max(lmin, rmin);
            let end = min(lmax, rmax);
            if start <= end {
                res.push(T::new(start, end));
            }
            if lmax < rmax {
                left += 1;
            }
            else {
                right += 1;
            }
        }
        Chain(res)
    }

    /// Returns a new chain with all items that are in either chain.
    pub fn union(&self, other: &Self) -> Self {
        self.0.iter().chain(other.0.iter()).cloned().collect()
    }

    /// Returns a new chain with all items of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut res = Vec::new();
        let mut start = 0;
        for block in &self.0 {
            // Skip over blocks of other that end before this block. Since
            // the blocks in self are ordered, these can’t matter for the
            // following blocks either.
            while start < other.0.len() && other.0[start].max() < block.min()
            {
                start += 1;
            }

            let (mut low, high) = block.bounds();
            let mut exhausted = false;
            for item in &other.0[start..] {
                if item.min() > high {
                    break
                }
                if item.min() > low {
                    if let Some(prev) = T::previous(item.min()) {
                        res.push(T::new(low, prev))
                    }
                }
                match T::next(item.max()) {
                    Some(next) if item.max() < high => low = next,
                    _ => {
                        exhausted = true;
                        break
                    }
                }
            }
            if !exhausted {
                res.push(T::new(low, high))
            }
        }
        Chain(res)
    }
}


//--- Default

impl<T: Block> Default for Chain<T> {
    fn default() -> Self {
        Self::empty()
    }
}


//--- FromIterator

impl<T: Block> iter::FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut blocks: Vec<T> = iter.into_iter().collect();
        blocks.sort_by_key(|block| block.min());

        let mut res: Vec<T> = Vec::with_capacity(blocks.len());
        for block in blocks {
            let merged = match res.last() {
                Some(last) => last.sum(&block),
                None => None
            };
            match merged {
                Some(sum) => {
                    let len = res.len();
                    res[len - 1] = sum;
                }
                None => res.push(block)
            }
        }
        Chain(res)
    }
}


//--- IntoIterator

impl<'a, T: Block> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}


//--- PartialEq and Eq

impl<T: Block> PartialEq for Chain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(left, right)| {
                left.bounds() == right.bounds()
            })
    }
}

impl<T: Block> Eq for Chain<T> { }


//============ Testing =======================================================
