//! The optional in-memory tree builder (§4.3), layered on top of
//! [`crate::scanner::ScanState`].
//!
//! Node storage does not come from the global allocator: every record is
//! obtained one at a time from a caller-supplied [`Allocator`] (§6, §9) and
//! freed explicitly, bottom-up, by a non-recursive traversal over a second
//! fixed-capacity work stack bounded by the same nesting limit construction
//! enforces — the teardown discipline §4.3 calls for. Nodes are linked by
//! raw first-child/next-sibling pointers rather than arena indices, since
//! each one is now its own allocation rather than an element of a shared
//! `Vec`; the raw-pointer-linked shape itself is grounded on `jsonmodem`'s
//! `path: Vec<NonNull<Value>>` zipper
//! (`examples/AaronFriel-jsonmodem/crates/jsonmodem/src/value_zipper.rs`),
//! the one file in this corpus that threads `NonNull` pointers through an
//! owned JSON value tree rather than through indices or `Box`/`Rc`. The
//! allocator-callback contract itself has no precedent in this corpus; it
//! is taken directly from §6/§9's literal description.

use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::dialect::Dialect;
use crate::error::{BuildError, ScanCode};
use crate::scanner::{ScanState, MAX_DEPTH};
use crate::span::Span;
use crate::token::TokenKind;

/// The tree builder's caller-supplied allocator (§6, §9): a single
/// operation that behaves as an allocate-zeroed call when `existing` is
/// `None`, and as a free call when it is `Some`. The C-shaped contract's
/// opaque `user_ptr` parameter has no separate counterpart here — `&mut
/// self` already carries whatever context an implementation needs, which is
/// the idiomatic translation of that parameter.
pub trait Allocator {
    /// `existing == None`: allocate `size` zeroed bytes, returning `None` on
    /// failure. `existing == Some(ptr)`: free the allocation previously
    /// returned for this same `size` by this same allocator; the return
    /// value in that case is always `None`. Reallocation is never
    /// requested.
    fn alloc(&mut self, existing: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>>;
}

/// The default [`Allocator`]: delegates to the process's global allocator.
/// What [`parse`] uses unless a caller supplies its own via
/// [`parse_with`]/[`build`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalAllocator;

impl Allocator for GlobalAllocator {
    fn alloc(&mut self, existing: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        let layout = core::alloc::Layout::from_size_align(size, core::mem::align_of::<Node>()).ok()?;
        match existing {
            None => {
                // SAFETY: `layout` has non-zero size — `Node` is never a
                // zero-sized type.
                let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
                NonNull::new(ptr)
            }
            Some(ptr) => {
                // SAFETY: `ptr` was returned by a previous call to this same
                // method with `existing: None` and this same `size`, and is
                // freed at most once — upheld by `free_node`, the only
                // caller.
                unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
                None
            }
        }
    }
}

/// A handle to a node in a [`Document`]. Borrows the document's lifetime so
/// the borrow checker rejects a `NodeId` used after the `Document` owning
/// its backing storage has been dropped.
#[derive(Debug, Clone, Copy)]
pub struct NodeId<'doc>(NonNull<Node>, PhantomData<&'doc Node>);

impl<'doc> PartialEq for NodeId<'doc> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'doc> Eq for NodeId<'doc> {}

/// The type of a parsed value (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

struct Node {
    kind: ValueType,
    span: Span,
    bool_value: bool,
    name_span: Option<Span>,
    first_child: Option<NonNull<Node>>,
    next_sibling: Option<NonNull<Node>>,
}

/// A parsed JSON/JSON5 document: each [`Node`] is its own allocation from
/// `A`, linked to its siblings/children by raw pointers. Dropping a
/// `Document` frees every node through the same allocator that produced it
/// (see the `Drop` impl below).
pub struct Document<'s, A: Allocator> {
    source: &'s [u8],
    root: Option<NonNull<Node>>,
    allocator: A,
}

impl<'s, A: Allocator> Document<'s, A> {
    pub fn root(&self) -> NodeId<'_> {
        NodeId(self.root.expect("a successfully built document always has a root"), PhantomData)
    }

    fn node(&self, id: NodeId<'_>) -> &Node {
        // SAFETY: every `NodeId` this module hands out borrows `self` and
        // wraps a pointer obtained from this same document's allocator,
        // never freed while that borrow is alive.
        unsafe { id.0.as_ref() }
    }

    pub fn get_type(&self, id: NodeId<'_>) -> ValueType {
        self.node(id).kind
    }

    /// The span of `id`'s own token: the opening delimiter for a container,
    /// or the whole lexeme for a scalar.
    pub fn value_span(&self, id: NodeId<'_>) -> Span {
        self.node(id).span
    }

    /// `Some` only when `id` is an object member's value.
    pub fn member_name_span(&self, id: NodeId<'_>) -> Option<Span> {
        self.node(id).name_span
    }

    /// Panics if `id` is not a `Bool` node: callers should check
    /// [`Document::get_type`] first, matching the teacher's convention of
    /// typed accessors that assume the caller already switched on the event.
    pub fn as_bool(&self, id: NodeId<'_>) -> bool {
        let node = self.node(id);
        assert!(matches!(node.kind, ValueType::Bool), "as_bool called on a non-bool node");
        node.bool_value
    }

    /// The number of direct children of an `Array` or `Object` node.
    pub fn length(&self, id: NodeId<'_>) -> usize {
        let mut count = 0;
        let mut cursor = self.node(id).first_child;
        while let Some(n) = cursor {
            count += 1;
            // SAFETY: see `node`.
            cursor = unsafe { n.as_ref() }.next_sibling;
        }
        count
    }

    pub fn first_child(&self, id: NodeId<'_>) -> Option<NodeId<'_>> {
        self.node(id).first_child.map(|n| NodeId(n, PhantomData))
    }

    pub fn next_sibling(&self, id: NodeId<'_>) -> Option<NodeId<'_>> {
        self.node(id).next_sibling.map(|n| NodeId(n, PhantomData))
    }

    /// Alias for [`Document::first_child`] at an `Object` node, reading more
    /// naturally at call sites that walk members rather than array elements.
    pub fn first_member(&self, id: NodeId<'_>) -> Option<NodeId<'_>> {
        self.first_child(id)
    }

    pub fn next_member(&self, id: NodeId<'_>) -> Option<NodeId<'_>> {
        self.next_sibling(id)
    }

    /// An object member node doubles as its own value: `member_value` is
    /// just `id` itself, kept as a distinct call for readability at sites
    /// that think in terms of "the member" versus "the member's value".
    pub fn member_value<'a>(&self, id: NodeId<'a>) -> NodeId<'a> {
        id
    }

    pub fn source(&self) -> &'s [u8] {
        self.source
    }
}

impl<'s, A: Allocator> Drop for Document<'s, A> {
    /// Non-recursive teardown (§4.3's `free`): walks the tree with a
    /// fixed-capacity work stack bounded by `MAX_DEPTH`, descending into
    /// first children and resuming at next siblings, freeing each node only
    /// after reading the pointer needed to continue past it.
    fn drop(&mut self) {
        let Some(root) = self.root else { return };

        let mut stack: [Option<NonNull<Node>>; MAX_DEPTH] = [None; MAX_DEPTH];
        let mut depth = 0usize;
        let mut current = Some(root);

        loop {
            match current {
                Some(node) => {
                    // SAFETY: `node` has not been freed yet — it is either
                    // `root`, or was reached via a `first_child`/
                    // `next_sibling` pointer read before its owner was freed.
                    let first_child = unsafe { node.as_ref() }.first_child;
                    if let Some(child) = first_child {
                        debug_assert!(depth < MAX_DEPTH, "tree deeper than construction could have produced");
                        stack[depth] = Some(node);
                        depth += 1;
                        current = Some(child);
                    } else {
                        let next = unsafe { node.as_ref() }.next_sibling;
                        free_node(&mut self.allocator, node);
                        current = next;
                    }
                }
                None => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    let parent = stack[depth].take().expect("pushed a frame for every descent");
                    let next = unsafe { parent.as_ref() }.next_sibling;
                    free_node(&mut self.allocator, parent);
                    current = next;
                }
            }
        }
    }
}

struct OpenContainer {
    node: NonNull<Node>,
    last_child: Option<NonNull<Node>>,
}

/// Drives a fresh [`ScanState`] to completion over `source`, building a
/// [`Document`] through the global allocator.
pub fn parse(source: &[u8], dialect: Dialect) -> Result<Document<'_, GlobalAllocator>, BuildError> {
    let mut scanner = ScanState::new(dialect);
    build(source, &mut scanner, GlobalAllocator)
}

/// As [`parse`], but through a caller-supplied [`Allocator`].
pub fn parse_with<A: Allocator>(source: &[u8], dialect: Dialect, allocator: A) -> Result<Document<'_, A>, BuildError> {
    let mut scanner = ScanState::new(dialect);
    build(source, &mut scanner, allocator)
}

/// As [`parse`], but over a scanner the caller already owns and may have
/// partially stepped (so long as it hasn't yet produced any token), and
/// through `allocator` rather than the global one.
///
/// On failure — a scan error or an allocator failure — every node allocated
/// so far is freed before returning, matching §4.3's "on failure, the
/// partial graph is destroyed" contract.
pub fn build<'s, A: Allocator>(
    source: &'s [u8],
    scanner: &mut ScanState,
    mut allocator: A,
) -> Result<Document<'s, A>, BuildError> {
    let mut stack: Vec<OpenContainer> = Vec::new();
    let mut allocated: Vec<NonNull<Node>> = Vec::new();
    let mut pending_name: Option<Span> = None;
    let mut root: Option<NonNull<Node>> = None;

    macro_rules! fail {
        ($err:expr) => {{
            for node in allocated.into_iter().rev() {
                free_node(&mut allocator, node);
            }
            return Err($err);
        }};
    }

    loop {
        let code = scanner.step(source);
        if code != ScanCode::Success {
            let err = BuildError::Scan(scanner.last_error().expect("a non-success code always latches a diagnostic"));
            fail!(err);
        }

        let token = scanner.token();
        let span = scanner.span();

        match token {
            TokenKind::Eof => break,
            TokenKind::ObjectName => {
                pending_name = Some(span);
            }
            TokenKind::ArrayEnd | TokenKind::ObjectEnd => {
                stack.pop();
            }
            TokenKind::ArrayBegin | TokenKind::ObjectBegin => {
                let kind = if token == TokenKind::ArrayBegin {
                    ValueType::Array
                } else {
                    ValueType::Object
                };
                let node = match push_node(&mut allocator, kind, span, pending_name.take(), false) {
                    Some(n) => n,
                    None => fail!(BuildError::OutOfMemory),
                };
                allocated.push(node);
                attach(&mut stack, &mut root, node);
                stack.push(OpenContainer { node, last_child: None });
            }
            TokenKind::Null | TokenKind::True | TokenKind::False | TokenKind::Number | TokenKind::String => {
                let (kind, bool_value) = match token {
                    TokenKind::Null => (ValueType::Null, false),
                    TokenKind::True => (ValueType::Bool, true),
                    TokenKind::False => (ValueType::Bool, false),
                    TokenKind::Number => (ValueType::Number, false),
                    TokenKind::String => (ValueType::String, false),
                    _ => unreachable!(),
                };
                let node = match push_node(&mut allocator, kind, span, pending_name.take(), bool_value) {
                    Some(n) => n,
                    None => fail!(BuildError::OutOfMemory),
                };
                allocated.push(node);
                attach(&mut stack, &mut root, node);
            }
            TokenKind::Invalid => {
                unreachable!("ScanCode::Success never pairs with TokenKind::Invalid")
            }
        }
    }

    Ok(Document { source, root, allocator })
}

fn push_node<A: Allocator>(
    allocator: &mut A,
    kind: ValueType,
    span: Span,
    name_span: Option<Span>,
    bool_value: bool,
) -> Option<NonNull<Node>> {
    let size = core::mem::size_of::<Node>();
    let raw = allocator.alloc(None, size)?;
    let ptr = raw.cast::<Node>();
    // SAFETY: `raw` points to at least `size` bytes of fresh allocation
    // suitably aligned for `Node` (the allocator contract requires it), and
    // nothing else aliases it yet.
    unsafe {
        ptr.as_ptr().write(Node {
            kind,
            span,
            bool_value,
            name_span,
            first_child: None,
            next_sibling: None,
        });
    }
    Some(ptr)
}

fn free_node<A: Allocator>(allocator: &mut A, node: NonNull<Node>) {
    let size = core::mem::size_of::<Node>();
    allocator.alloc(Some(node.cast::<u8>()), size);
}

fn attach(stack: &mut [OpenContainer], root: &mut Option<NonNull<Node>>, node: NonNull<Node>) {
    let Some(parent) = stack.last_mut() else {
        *root = Some(node);
        return;
    };
    match parent.last_child {
        // SAFETY: `last` is a node already attached under `parent` and not
        // yet freed — construction never frees a node before `Eof`.
        Some(last) => unsafe { (*last.as_ptr()).next_sibling = Some(node) },
        // SAFETY: `parent.node` is the currently open container, still
        // alive until its matching close token.
        None => unsafe { (*parent.node.as_ptr()).first_child = Some(node) },
    }
    parent.last_child = Some(node);
    if root.is_none() {
        *root = Some(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn builds_flat_object() {
        let json = br#"{"a": 1, "b": true}"#;
        let doc = parse(json, Dialect::default()).unwrap();
        assert_eq!(doc.get_type(doc.root()), ValueType::Object);
        assert_eq!(doc.length(doc.root()), 2);

        let a = doc.first_member(doc.root()).unwrap();
        assert_eq!(doc.get_type(a), ValueType::Number);
        assert_eq!(doc.member_name_span(a).unwrap().slice(json), b"\"a\"");

        let b = doc.next_member(a).unwrap();
        assert_eq!(doc.get_type(b), ValueType::Bool);
        assert!(doc.as_bool(b));
        assert!(doc.next_member(b).is_none());
    }

    #[test]
    fn builds_nested_array() {
        let json = br#"[1, [2, 3], null]"#;
        let doc = parse(json, Dialect::default()).unwrap();
        assert_eq!(doc.get_type(doc.root()), ValueType::Array);
        assert_eq!(doc.length(doc.root()), 3);

        let first = doc.first_child(doc.root()).unwrap();
        let nested = doc.next_sibling(first).unwrap();
        assert_eq!(doc.get_type(nested), ValueType::Array);
        assert_eq!(doc.length(nested), 2);

        let last = doc.next_sibling(nested).unwrap();
        assert_eq!(doc.get_type(last), ValueType::Null);
        assert!(doc.next_sibling(last).is_none());
    }

    #[test]
    fn reports_scan_errors() {
        let json = br#"{"a": }"#;
        let err = parse(json, Dialect::default()).unwrap_err();
        assert!(matches!(err, BuildError::Scan(_)));
    }

    struct FailingAllocator {
        allowed: usize,
        issued: usize,
        delegate: GlobalAllocator,
    }

    impl Allocator for FailingAllocator {
        fn alloc(&mut self, existing: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
            if existing.is_none() {
                if self.issued >= self.allowed {
                    return None;
                }
                self.issued += 1;
            }
            self.delegate.alloc(existing, size)
        }
    }

    #[test]
    fn out_of_memory_during_construction_frees_the_partial_graph() {
        let json = br#"[1, 2, 3, 4, 5]"#;
        let allocator = FailingAllocator { allowed: 2, issued: 0, delegate: GlobalAllocator };
        let err = parse_with(json, Dialect::default(), allocator).unwrap_err();
        assert!(matches!(err, BuildError::OutOfMemory));
    }
}
