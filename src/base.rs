//! Raw red-black tree engine.
//!
//! Nodes are heap cells linked with raw pointers; the tree exclusively owns
//! every node reachable from `root`, and `parent` links are non-owning
//! back-references used only for traversal and fixup. All pointer surgery is
//! confined to this module; the safe map facade lives in `lib.rs`.

use crate::Compare;
use std::collections::VecDeque;
use std::fmt;
use std::ptr::NonNull;

pub(crate) type Link<K, V> = Option<NonNull<Node<K, V>>>;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) struct Node<K, V> {
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) parent: Link<K, V>,
    pub(crate) color: Color,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    fn boxed(key: K, value: V, color: Color, parent: Link<K, V>) -> NonNull<Node<K, V>> {
        NonNull::from(Box::leak(Box::new(Node {
            left: None,
            right: None,
            parent,
            color,
            key,
            value,
        })))
    }

    /// `child(true)` is the left child, `child(false)` the right.
    #[inline]
    pub(crate) fn child(&self, on_left: bool) -> Link<K, V> {
        if on_left {
            self.left
        } else {
            self.right
        }
    }

    #[inline]
    fn set_child(&mut self, on_left: bool, link: Link<K, V>) {
        if on_left {
            self.left = link;
        } else {
            self.right = link;
        }
    }
}

/// Absent children count as black.
#[inline]
fn color_of<K, V>(link: Link<K, V>) -> Color {
    match link {
        Some(node) => unsafe { node.as_ref().color },
        None => Color::Black,
    }
}

#[inline]
unsafe fn set_color<K, V>(mut node: NonNull<Node<K, V>>, color: Color) {
    node.as_mut().color = color;
}

#[inline]
unsafe fn unwrap_link<K, V>(link: Link<K, V>) -> NonNull<Node<K, V>> {
    debug_assert!(link.is_some(), "unwrapping a null link");
    match link {
        Some(node) => node,
        None => std::hint::unreachable_unchecked(),
    }
}

pub(crate) unsafe fn min_node<K, V>(mut node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    while let Some(left) = node.as_ref().left {
        node = left;
    }
    node
}

pub(crate) unsafe fn max_node<K, V>(mut node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    while let Some(right) = node.as_ref().right {
        node = right;
    }
    node
}

/// In-order successor, or `None` past the maximum.
pub(crate) unsafe fn successor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    if let Some(right) = node.as_ref().right {
        return Some(min_node(right));
    }
    let mut current = node;
    let mut parent = current.as_ref().parent;
    while let Some(up) = parent {
        if up.as_ref().right != Some(current) {
            break;
        }
        current = up;
        parent = up.as_ref().parent;
    }
    parent
}

/// In-order predecessor, or `None` before the minimum.
pub(crate) unsafe fn predecessor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    if let Some(left) = node.as_ref().left {
        return Some(max_node(left));
    }
    let mut current = node;
    let mut parent = current.as_ref().parent;
    while let Some(up) = parent {
        if up.as_ref().left != Some(current) {
            break;
        }
        current = up;
        parent = up.as_ref().parent;
    }
    parent
}

pub(crate) enum VacantLocation<K, V> {
    Empty,
    Left { parent: NonNull<Node<K, V>> },
    Right { parent: NonNull<Node<K, V>> },
}

pub(crate) enum Location<K, V> {
    Vacant(VacantLocation<K, V>),
    Occupied { node: NonNull<Node<K, V>> },
}

pub(crate) struct RBRoot<K, V, C> {
    pub(crate) root: Link<K, V>,
    pub(crate) compare: C,
    pub(crate) len: usize,
}

impl<K, V, C> RBRoot<K, V, C> {
    pub(crate) fn new(compare: C) -> Self {
        RBRoot {
            root: None,
            compare,
            len: 0,
        }
    }

    pub(crate) fn first(&self) -> Link<K, V> {
        self.root.map(|root| unsafe { min_node(root) })
    }

    pub(crate) fn last(&self) -> Link<K, V> {
        self.root.map(|root| unsafe { max_node(root) })
    }

    /// Attaches a new node at a vacant location and restores the invariants.
    pub(crate) fn insert_at(
        &mut self,
        location: VacantLocation<K, V>,
        key: K,
        value: V,
    ) -> NonNull<Node<K, V>> {
        let node = match location {
            VacantLocation::Empty => {
                debug_assert!(self.root.is_none());
                let node = Node::boxed(key, value, Color::Black, None);
                self.root = Some(node);
                node
            }
            VacantLocation::Left { mut parent } => {
                let node = Node::boxed(key, value, Color::Red, Some(parent));
                unsafe {
                    debug_assert!(parent.as_ref().left.is_none());
                    parent.as_mut().left = Some(node);
                    self.insert_fixup(node);
                }
                node
            }
            VacantLocation::Right { mut parent } => {
                let node = Node::boxed(key, value, Color::Red, Some(parent));
                unsafe {
                    debug_assert!(parent.as_ref().right.is_none());
                    parent.as_mut().right = Some(node);
                    self.insert_fixup(node);
                }
                node
            }
        };
        self.len += 1;
        node
    }

    unsafe fn insert_fixup(&mut self, mut target: NonNull<Node<K, V>>) {
        loop {
            let parent = match target.as_ref().parent {
                Some(parent) if parent.as_ref().color == Color::Red => parent,
                _ => break,
            };
            // a red node is never the root, so the grandparent exists
            let grandparent = unwrap_link(parent.as_ref().parent);
            let parent_on_left = grandparent.as_ref().left == Some(parent);
            let uncle = grandparent.as_ref().child(!parent_on_left);
            match uncle {
                Some(uncle) if uncle.as_ref().color == Color::Red => {
                    // push the violation up
                    set_color(parent, Color::Black);
                    set_color(uncle, Color::Black);
                    set_color(grandparent, Color::Red);
                    target = grandparent;
                }
                _ => {
                    if (parent.as_ref().right == Some(target)) == parent_on_left {
                        // zig-zag: straighten through the parent first
                        target = parent;
                        self.rotate(target, parent_on_left);
                    }
                    let parent = unwrap_link(target.as_ref().parent);
                    let grandparent = unwrap_link(parent.as_ref().parent);
                    set_color(parent, Color::Black);
                    set_color(grandparent, Color::Red);
                    self.rotate(grandparent, !parent_on_left);
                }
            }
        }
        if let Some(root) = self.root {
            set_color(root, Color::Black);
        }
    }

    /// Unlinks `target` from the tree, restores the invariants, and returns
    /// its entry. The caller must guarantee `target` belongs to this tree.
    pub(crate) unsafe fn erase_node(&mut self, target: NonNull<Node<K, V>>) -> (K, V) {
        debug_assert!(self.len > 0);
        let (t_left, t_right, t_parent, t_color) = {
            let t = target.as_ref();
            (t.left, t.right, t.parent, t.color)
        };
        let mut erased_color = t_color;
        let mut broken = t_parent;
        let mut left_broken = match t_parent {
            Some(parent) => parent.as_ref().left == Some(target),
            None => true,
        };
        match (t_left, t_right) {
            (None, None) => {
                self.replace_child(target, None);
            }
            (Some(mut only), None) | (None, Some(mut only)) => {
                only.as_mut().parent = t_parent;
                self.replace_child(target, Some(only));
            }
            (Some(mut t_left), Some(mut t_right)) => {
                // reduce to the <=1-child case by relocating the in-order
                // successor into the target's slot; the color that goes
                // missing is the successor's, not the target's
                let mut candidate = min_node(t_right);
                erased_color = candidate.as_ref().color;
                if candidate == t_right {
                    broken = Some(candidate);
                    left_broken = false;
                } else {
                    // detach the successor, handing its right child over to
                    // its former parent; the deficiency sits on that
                    // parent's left side
                    let mut old_parent = unwrap_link(candidate.as_ref().parent);
                    broken = Some(old_parent);
                    left_broken = true;
                    let candidate_right = candidate.as_ref().right;
                    old_parent.as_mut().left = candidate_right;
                    if let Some(mut candidate_right) = candidate_right {
                        candidate_right.as_mut().parent = Some(old_parent);
                    }
                    t_right.as_mut().parent = Some(candidate);
                    candidate.as_mut().right = Some(t_right);
                }
                t_left.as_mut().parent = Some(candidate);
                candidate.as_mut().left = Some(t_left);
                candidate.as_mut().parent = t_parent;
                candidate.as_mut().color = t_color;
                self.replace_child(target, Some(candidate));
            }
        }
        let node = Box::from_raw(target.as_ptr());
        self.len -= 1;
        if erased_color == Color::Black {
            self.erase_fixup(broken, left_broken);
        }
        let Node { key, value, .. } = *node;
        (key, value)
    }

    /// Restores the black-height invariant after a black node vanished from
    /// the `left_broken` side of `target`. The removed node no longer
    /// exists, so the fixup is anchored on its parent plus a side flag.
    unsafe fn erase_fixup(&mut self, mut target: Link<K, V>, mut left_broken: bool) {
        while let Some(this) = target {
            let child = this.as_ref().child(left_broken);
            if color_of(child) == Color::Red {
                // a red child absorbs the missing black
                set_color(unwrap_link(child), Color::Black);
                return;
            }
            let mut brother = unwrap_link(this.as_ref().child(!left_broken));
            if brother.as_ref().color == Color::Red {
                set_color(brother, Color::Black);
                set_color(this, Color::Red);
                self.rotate(this, left_broken);
                brother = unwrap_link(this.as_ref().child(!left_broken));
            }
            if color_of(brother.as_ref().child(left_broken)) == Color::Black
                && color_of(brother.as_ref().child(!left_broken)) == Color::Black
            {
                // both nephews black: drop a black from the sibling side and
                // move the deficiency up
                set_color(brother, Color::Red);
                let parent = this.as_ref().parent;
                if let Some(parent) = parent {
                    left_broken = parent.as_ref().left == Some(this);
                }
                target = parent;
            } else {
                if color_of(brother.as_ref().child(!left_broken)) == Color::Black {
                    // near nephew red, far nephew black: straighten first
                    set_color(unwrap_link(brother.as_ref().child(left_broken)), Color::Black);
                    set_color(brother, Color::Red);
                    self.rotate(brother, !left_broken);
                    brother = unwrap_link(this.as_ref().child(!left_broken));
                }
                set_color(brother, this.as_ref().color);
                set_color(this, Color::Black);
                set_color(unwrap_link(brother.as_ref().child(!left_broken)), Color::Black);
                self.rotate(this, left_broken);
                return;
            }
        }
        // the deficiency climbed past the root
        if let Some(root) = self.root {
            set_color(root, Color::Black);
        }
    }

    /// `rotate(x, true)` rotates left: the right child becomes the subtree
    /// root, `x` becomes its left child, and the middle subtree moves over.
    /// The in-order key sequence is unchanged.
    unsafe fn rotate(&mut self, mut target: NonNull<Node<K, V>>, to_left: bool) {
        let mut pivot = unwrap_link(target.as_ref().child(!to_left));
        self.replace_child(target, Some(pivot));
        let middle = pivot.as_ref().child(to_left);
        pivot.as_mut().parent = target.as_ref().parent;
        pivot.as_mut().set_child(to_left, Some(target));
        target.as_mut().parent = Some(pivot);
        target.as_mut().set_child(!to_left, middle);
        if let Some(mut middle) = middle {
            middle.as_mut().parent = Some(target);
        }
    }

    /// Repoints whichever slot held `old` (a parent's child link, or `root`)
    /// at `new`. Does not touch `new`'s parent link.
    unsafe fn replace_child(&mut self, old: NonNull<Node<K, V>>, new: Link<K, V>) {
        match old.as_ref().parent {
            Some(mut parent) => {
                if parent.as_ref().left == Some(old) {
                    parent.as_mut().left = new;
                } else {
                    debug_assert!(parent.as_ref().right == Some(old));
                    parent.as_mut().right = new;
                }
            }
            None => self.root = new,
        }
    }

    /// Frees every node without recursion: walk to the subtree minimum, then
    /// release nodes while ascending, so arbitrarily deep trees cannot
    /// exhaust the stack.
    pub(crate) fn clear(&mut self) {
        unsafe {
            let mut current = self.root.map(|root| min_node(root));
            while let Some(node) = current {
                if let Some(right) = node.as_ref().right {
                    current = Some(min_node(right));
                } else {
                    let mut node = node;
                    let mut candidate = node.as_ref().parent;
                    while let Some(parent) = candidate {
                        if parent.as_ref().right != Some(node) {
                            break;
                        }
                        drop(Box::from_raw(node.as_ptr()));
                        node = parent;
                        candidate = parent.as_ref().parent;
                    }
                    drop(Box::from_raw(node.as_ptr()));
                    current = candidate;
                }
            }
        }
        self.root = None;
        self.len = 0;
    }

    /// Structural deep copy preserving the exact shape and colors, again
    /// iteratively: clone the left spine down to the minimum, then walk
    /// in-order successors upward.
    pub(crate) fn clone_tree(&self) -> RBRoot<K, V, C>
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        let mut new = RBRoot {
            root: None,
            compare: self.compare.clone(),
            len: self.len,
        };
        if let Some(src_root) = self.root {
            unsafe {
                let root = {
                    let src = src_root.as_ref();
                    Node::boxed(src.key.clone(), src.value.clone(), src.color, None)
                };
                new.root = Some(root);
                copy_children(src_root, root);
            }
        }
        new
    }

    /// Black-height validation: `true` iff the root is black (or absent), no
    /// red node has a red child, and every path to an absent child crosses
    /// the same number of black nodes.
    pub(crate) fn is_valid(&self) -> bool {
        match self.root {
            None => true,
            Some(root) => unsafe {
                root.as_ref().color == Color::Black && black_height(Some(root)).is_some()
            },
        }
    }

    /// Writes the keys in breadth-first order, space-separated.
    pub(crate) fn dump_level_order(&self, out: &mut dyn fmt::Write) -> fmt::Result
    where
        K: fmt::Display,
    {
        let mut queue = VecDeque::new();
        if let Some(root) = self.root {
            queue.push_back(root);
        }
        let mut first = true;
        while let Some(node) = queue.pop_front() {
            let node = unsafe { node.as_ref() };
            if !first {
                out.write_char(' ')?;
            }
            write!(out, "{}", node.key)?;
            first = false;
            if let Some(left) = node.left {
                queue.push_back(left);
            }
            if let Some(right) = node.right {
                queue.push_back(right);
            }
        }
        Ok(())
    }
}

impl<K, V, C: Compare<K>> RBRoot<K, V, C> {
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        !self.compare.less(a, b) && !self.compare.less(b, a)
    }

    /// Walks from the root to the matching node, or to the node under which
    /// `key` would be inserted. `None` only when the tree is empty.
    pub(crate) fn find_node(&self, key: &K) -> Link<K, V> {
        let mut current = self.root?;
        loop {
            let node = unsafe { current.as_ref() };
            let next = if self.keys_equal(key, &node.key) {
                return Some(current);
            } else if self.compare.less(key, &node.key) {
                node.left
            } else {
                node.right
            };
            match next {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
    }

    pub(crate) fn location(&self, key: &K) -> Location<K, V> {
        match self.find_node(key) {
            None => Location::Vacant(VacantLocation::Empty),
            Some(candidate) => {
                let node = unsafe { candidate.as_ref() };
                if self.keys_equal(key, &node.key) {
                    Location::Occupied { node: candidate }
                } else if self.compare.less(key, &node.key) {
                    Location::Vacant(VacantLocation::Left { parent: candidate })
                } else {
                    Location::Vacant(VacantLocation::Right { parent: candidate })
                }
            }
        }
    }

    pub(crate) fn lookup(&self, key: &K) -> Link<K, V> {
        match self.location(key) {
            Location::Occupied { node } => Some(node),
            Location::Vacant(..) => None,
        }
    }

    pub(crate) fn erase(&mut self, key: &K) -> bool {
        match self.lookup(key) {
            Some(node) => {
                unsafe {
                    self.erase_node(node);
                }
                true
            }
            None => false,
        }
    }

    /// First node with key not less than `key`, or `None`.
    pub(crate) fn lower_bound(&self, key: &K) -> Link<K, V> {
        let candidate = self.find_node(key)?;
        if self.compare.less(unsafe { &candidate.as_ref().key }, key) {
            unsafe { successor(candidate) }
        } else {
            Some(candidate)
        }
    }
}

impl<K, V, C> Drop for RBRoot<K, V, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Clones the left spine below `from` onto `to`, descending both cursors to
/// the subtree minimum.
unsafe fn copy_min_spine<K: Clone, V: Clone>(
    from: &mut NonNull<Node<K, V>>,
    to: &mut NonNull<Node<K, V>>,
) {
    while let Some(next) = from.as_ref().left {
        let child = {
            let src = next.as_ref();
            Node::boxed(src.key.clone(), src.value.clone(), src.color, Some(*to))
        };
        to.as_mut().left = Some(child);
        *from = next;
        *to = child;
    }
}

unsafe fn copy_children<K: Clone, V: Clone>(
    from_root: NonNull<Node<K, V>>,
    to_root: NonNull<Node<K, V>>,
) {
    let mut from = from_root;
    let mut to = to_root;
    copy_min_spine(&mut from, &mut to);
    loop {
        if let Some(next) = from.as_ref().right {
            let child = {
                let src = next.as_ref();
                Node::boxed(src.key.clone(), src.value.clone(), src.color, Some(to))
            };
            to.as_mut().right = Some(child);
            from = next;
            to = child;
            copy_min_spine(&mut from, &mut to);
        } else {
            // ascend past every node whose right subtree is finished
            let mut candidate = from.as_ref().parent;
            while let Some(parent) = candidate {
                if parent.as_ref().right != Some(from) {
                    break;
                }
                from = parent;
                to = unwrap_link(to.as_ref().parent);
                candidate = parent.as_ref().parent;
            }
            match candidate {
                Some(parent) => {
                    from = parent;
                    to = unwrap_link(to.as_ref().parent);
                }
                None => break,
            }
        }
    }
}

/// Black-height of the subtree, counting the node itself; `None` when a red
/// node has a red child or the two subtrees disagree.
unsafe fn black_height<K, V>(link: Link<K, V>) -> Option<usize> {
    let node = match link {
        Some(node) => node,
        None => return Some(1),
    };
    let node = node.as_ref();
    if node.color == Color::Red
        && (color_of(node.left) == Color::Red || color_of(node.right) == Color::Red)
    {
        return None;
    }
    let right = black_height(node.right)?;
    let left = black_height(node.left)?;
    if left != right {
        return None;
    }
    Some(right + (node.color == Color::Black) as usize)
}
