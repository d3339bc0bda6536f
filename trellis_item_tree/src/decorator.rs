// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decorator chains and coordinate conversion between enclosing spaces.
//!
//! A decorator wraps exactly one node, which may itself be a decorator, so an
//! item is displayed through a chain `item <- d1 <- d2 <- ...`. The outermost
//! decorator is the item's display surface; it takes the item's place in the
//! parent group's geometry, while the item stays the semantic child of the
//! group.
//!
//! Every node's frame lives in the content space of its enclosing item: the
//! decorator wrapping it, or (for an undecorated item and for the outermost
//! decorator) the parent group.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::error::{TreeError, TreeResult};
use crate::mutation::Mutation;
use crate::tree::{Snapshot, Tree};
use crate::types::{Autoresizing, ItemId, ItemKind};

impl Tree {
    /// Wrap `item` in `decorator`, outside any decorators it already has.
    ///
    /// The decorator takes over the display frame and autoresizing of the
    /// node it wraps; the wrapped node moves to the origin of the decorator's
    /// content space and fills it. The prior geometry is remembered and put
    /// back by [`Tree::remove_decorator`].
    ///
    /// Returns [`TreeError::DecoratorRejected`] when either side vetoes the
    /// pairing, such as a window wrapping another window.
    ///
    /// # Panics
    ///
    /// Panics if `decorator` is `item` or is already part of a chain.
    pub fn set_decorator(&mut self, item: ItemId, decorator: ItemId) -> TreeResult<()> {
        if !self.is_alive(item) {
            return Err(TreeError::StaleItem(item));
        }
        let deco = self
            .node_opt(decorator)
            .ok_or(TreeError::StaleItem(decorator))?;
        let ItemKind::Decorator(deco_kind) = deco.kind else {
            return Err(TreeError::NotADecorator(decorator));
        };
        assert_ne!(item, decorator, "{item:?} cannot decorate itself");
        assert!(
            deco.decorated.is_none() && deco.decorator.is_none() && deco.parent.is_none(),
            "decorator {decorator:?} is already in use"
        );

        let target = self.last_decorator(item);
        let target_kind = self.node(target).kind;
        let accepted = deco_kind.can_decorate(&target_kind)
            && match target_kind {
                ItemKind::Decorator(inner) => inner.accepts_decorator(&deco_kind),
                _ => true,
            };
        if !accepted {
            tracing::warn!(target: crate::targets::DECORATOR, ?item, ?decorator, "decoration vetoed");
            return Err(TreeError::DecoratorRejected { item, decorator });
        }

        let inner = self.node(target);
        let snapshot = Snapshot {
            frame: inner.frame,
            autoresizing: inner.autoresizing,
        };
        let chrome = deco_kind.chrome();
        let outer_size = Size::new(
            snapshot.frame.width() + chrome.x,
            snapshot.frame.height() + chrome.y,
        );

        let deco = self.node_mut(decorator);
        deco.frame = Rect::from_origin_size(snapshot.frame.origin(), outer_size);
        deco.autoresizing = snapshot.autoresizing;
        deco.decorated = Some(target);
        deco.snapshot = Some(snapshot);

        let inner = self.node_mut(target);
        inner.frame = Rect::from_origin_size(Point::ORIGIN, snapshot.frame.size());
        inner.autoresizing = Autoresizing::FILL;
        inner.decorator = Some(decorator);

        let semantic = self.first_decorated_item(item);
        if let Some(parent) = self.parent_of(semantic) {
            self.mark_dirty(parent);
        }
        self.record(Mutation::Decorated {
            item: semantic,
            decorator,
        });
        Ok(())
    }

    /// Unwrap `decorator` from its chain and return the node it wrapped.
    ///
    /// When the decorator was outermost, the wrapped node gets back its
    /// remembered autoresizing and takes the decorator's current position, so
    /// a decorated item that was moved around stays where it was put. A
    /// decorator in the middle of a chain is spliced out and the outer
    /// decorator now wraps the inner node directly.
    pub fn remove_decorator(&mut self, decorator: ItemId) -> TreeResult<ItemId> {
        let deco = self
            .node_opt(decorator)
            .ok_or(TreeError::StaleItem(decorator))?;
        let ItemKind::Decorator(deco_kind) = deco.kind else {
            return Err(TreeError::NotADecorator(decorator));
        };
        let inner = deco.decorated.ok_or(TreeError::Detached(decorator))?;
        let outer = deco.decorator;
        let origin = deco.frame.origin();
        let snapshot = deco.snapshot;
        let inner_size = self.node(inner).frame.size();

        match outer {
            Some(outer) => {
                let chrome = deco_kind.chrome();
                self.node_mut(outer).decorated = Some(inner);
                // Every wrapper further out loses the spliced chrome.
                let mut above = Some(outer);
                while let Some(id) = above {
                    let node = self.node_mut(id);
                    node.frame = shrink(node.frame, chrome);
                    if let Some(s) = node.snapshot.as_mut() {
                        s.frame = shrink(s.frame, chrome);
                    }
                    above = node.decorator;
                }
                let inner_node = self.node_mut(inner);
                inner_node.decorator = Some(outer);
                inner_node.frame = Rect::from_origin_size(Point::ORIGIN, inner_size);
            }
            None => {
                let inner_node = self.node_mut(inner);
                inner_node.decorator = None;
                inner_node.frame = Rect::from_origin_size(origin, inner_size);
                if let Some(s) = snapshot {
                    inner_node.autoresizing = s.autoresizing;
                }
            }
        }

        let deco = self.node_mut(decorator);
        deco.decorated = None;
        deco.decorator = None;
        deco.snapshot = None;

        let semantic = self.first_decorated_item(inner);
        if let Some(parent) = self.parent_of(semantic) {
            self.mark_dirty(parent);
        }
        self.record(Mutation::Undecorated {
            item: semantic,
            decorator,
        });
        Ok(inner)
    }

    /// Immediate decorator wrapping `id`.
    pub fn decorator_of(&self, id: ItemId) -> Option<ItemId> {
        self.node_opt(id).and_then(|n| n.decorator)
    }

    /// Node immediately wrapped by a decorator.
    pub fn decorated_of(&self, decorator: ItemId) -> Option<ItemId> {
        self.node_opt(decorator).and_then(|n| n.decorated)
    }

    /// Semantic item at the bottom of `id`'s chain; `id` itself for items.
    pub fn first_decorated_item(&self, id: ItemId) -> ItemId {
        let mut current = id;
        while let Some(inner) = self.decorated_of(current) {
            current = inner;
        }
        current
    }

    /// Outermost decorator around `id`; `id` itself when undecorated.
    pub fn last_decorator(&self, id: ItemId) -> ItemId {
        let mut current = id;
        while let Some(outer) = self.decorator_of(current) {
            current = outer;
        }
        current
    }

    /// Decorators around `item`, innermost first.
    pub fn decorator_chain(&self, item: ItemId) -> SmallVec<[ItemId; 4]> {
        let mut chain = SmallVec::new();
        let mut current = item;
        while let Some(outer) = self.decorator_of(current) {
            chain.push(outer);
            current = outer;
        }
        chain
    }

    /// Node whose content space holds `id`'s frame.
    pub fn enclosing_item(&self, id: ItemId) -> Option<ItemId> {
        self.decorator_of(id)
            .or_else(|| self.parent_of(self.first_decorated_item(id)))
    }

    /// Node that stands for `id` in its parent group's geometry.
    pub fn display_surface(&self, id: ItemId) -> ItemId {
        self.last_decorator(self.first_decorated_item(id))
    }

    /// Frame of `id`'s display surface in the parent group's content space.
    pub fn display_frame(&self, id: ItemId) -> Option<Rect> {
        self.frame(self.last_decorator(id))
    }

    /// Offset from a node's local origin to the origin of its content space.
    fn content_offset(&self, id: ItemId) -> Vec2 {
        match self.kind(id) {
            Some(ItemKind::Decorator(kind)) => kind.content_offset(),
            _ => Vec2::ZERO,
        }
    }

    /// Map a point from `id`'s content space into its enclosing item's.
    pub fn convert_point_to_enclosing(&self, id: ItemId, p: Point) -> Option<Point> {
        let node = self.node_opt(id)?;
        let local = node.transform * p + self.content_offset(id);
        Some(local + node.frame.origin().to_vec2())
    }

    /// Map a point from the enclosing item's content space into `id`'s.
    pub fn convert_point_from_enclosing(&self, id: ItemId, p: Point) -> Option<Point> {
        let node = self.node_opt(id)?;
        let local = p - node.frame.origin().to_vec2() - self.content_offset(id);
        if node.transform.is_finite() && node.transform.determinant() != 0.0 {
            Some(node.transform.inverse() * local)
        } else {
            None
        }
    }

    /// Map a rectangle from `id`'s content space into its enclosing item's,
    /// as the bounding box of the transformed corners.
    pub fn convert_rect_to_enclosing(&self, id: ItemId, rect: Rect) -> Option<Rect> {
        let node = self.node_opt(id)?;
        let offset = self.content_offset(id) + node.frame.origin().to_vec2();
        Some(node.transform.transform_rect_bbox(rect) + offset)
    }

    /// Map a rectangle from the enclosing item's content space into `id`'s.
    pub fn convert_rect_from_enclosing(&self, id: ItemId, rect: Rect) -> Option<Rect> {
        let node = self.node_opt(id)?;
        let offset = self.content_offset(id) + node.frame.origin().to_vec2();
        let local = rect - offset;
        if !node.transform.is_finite() || node.transform.determinant() == 0.0 {
            return None;
        }
        Some(node.transform.inverse().transform_rect_bbox(local))
    }

    /// Enclosing chain from `id` up to, but excluding, `ancestor`.
    ///
    /// Returns `None` if `ancestor` never encloses `id`.
    fn enclosing_path(&self, ancestor: ItemId, id: ItemId) -> Option<Vec<ItemId>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != ancestor {
            path.push(current);
            current = self.enclosing_item(current)?;
        }
        Some(path)
    }

    /// Map a point from `id`'s content space into `ancestor`'s, crossing
    /// decorators on the way.
    pub fn convert_point_to_ancestor(&self, id: ItemId, ancestor: ItemId, p: Point) -> Option<Point> {
        let path = self.enclosing_path(ancestor, id)?;
        path.into_iter()
            .try_fold(p, |p, node| self.convert_point_to_enclosing(node, p))
    }

    /// Map a point from `ancestor`'s content space into `id`'s.
    pub fn convert_point_from_ancestor(&self, ancestor: ItemId, id: ItemId, p: Point) -> Option<Point> {
        let path = self.enclosing_path(ancestor, id)?;
        path.into_iter()
            .rev()
            .try_fold(p, |p, node| self.convert_point_from_enclosing(node, p))
    }

    /// Map a point from the parent group's content space into `item`'s
    /// content space, through its whole decorator chain.
    pub fn convert_point_to_content(&self, item: ItemId, p: Point) -> Option<Point> {
        let item = self.first_decorated_item(item);
        let parent = self.enclosing_item(self.last_decorator(item))?;
        self.convert_point_from_ancestor(parent, item, p)
    }

    /// Map a rectangle from the parent group's content space into `item`'s
    /// content space, through its whole decorator chain.
    pub fn convert_rect_to_content(&self, item: ItemId, rect: Rect) -> Option<Rect> {
        let item = self.first_decorated_item(item);
        let mut rect = rect;
        for decorator in self.decorator_chain(item).into_iter().rev() {
            rect = self.convert_rect_from_enclosing(decorator, rect)?;
        }
        self.convert_rect_from_enclosing(item, rect)
    }

    /// Map a rectangle of `item`'s content into the parent group's content
    /// space, through its whole decorator chain.
    pub fn convert_rect_from_content(&self, item: ItemId, rect: Rect) -> Option<Rect> {
        let item = self.first_decorated_item(item);
        let mut rect = self.convert_rect_to_enclosing(item, rect)?;
        for decorator in self.decorator_chain(item) {
            rect = self.convert_rect_to_enclosing(decorator, rect)?;
        }
        Some(rect)
    }
}

fn shrink(frame: Rect, chrome: Vec2) -> Rect {
    let size = Size::new(
        (frame.width() - chrome.x).max(0.0),
        (frame.height() - chrome.y).max(0.0),
    );
    Rect::from_origin_size(frame.origin(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecoratorKind, ItemDesc};
    use kurbo::Affine;

    fn setup() -> (Tree, ItemId, ItemId) {
        let mut tree = Tree::new();
        let group = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 400.0, 400.0)));
        let item = tree.insert_item(ItemDesc::with_frame(Rect::new(10.0, 20.0, 110.0, 70.0)));
        tree.add_child(group, item).unwrap();
        (tree, group, item)
    }

    #[test]
    fn chain_resolves_back_to_the_item() {
        let (mut tree, group, item) = setup();
        let d1 = tree.insert_decorator(DecoratorKind::Custom(0));
        let d2 = tree.insert_decorator(DecoratorKind::TitleBar { height: 12.0 });
        let d3 = tree.insert_decorator(DecoratorKind::Window);
        tree.set_decorator(item, d1).unwrap();
        tree.set_decorator(item, d2).unwrap();
        // Decorating through a decorator extends the same chain.
        tree.set_decorator(d1, d3).unwrap();

        assert_eq!(tree.decorator_chain(item).as_slice(), &[d1, d2, d3]);
        for d in [d1, d2, d3] {
            assert_eq!(tree.first_decorated_item(d), item);
            assert_eq!(tree.parent_of(d), None);
        }
        assert_eq!(tree.last_decorator(item), d3);
        assert_eq!(tree.display_surface(d1), d3);
        assert_eq!(tree.enclosing_item(item), Some(d1));
        assert_eq!(tree.enclosing_item(d3), Some(group));
        assert_eq!(tree.parent_of(item), Some(group));
    }

    #[test]
    fn decorator_takes_over_display_geometry() {
        let (mut tree, _, item) = setup();
        tree.set_autoresizing(item, Autoresizing::FLEXIBLE_MAX_X)
            .unwrap();
        let bar = tree.insert_decorator(DecoratorKind::TitleBar { height: 10.0 });
        tree.set_decorator(item, bar).unwrap();
        assert_eq!(tree.frame(bar), Some(Rect::new(10.0, 20.0, 110.0, 80.0)));
        assert_eq!(tree.frame(item), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(tree.autoresizing(item), Some(Autoresizing::FILL));
        assert_eq!(tree.autoresizing(bar), Some(Autoresizing::FLEXIBLE_MAX_X));
        assert_eq!(tree.display_frame(item), tree.frame(bar));
    }

    #[test]
    fn removing_outermost_restores_and_keeps_position() {
        let (mut tree, _, item) = setup();
        tree.set_autoresizing(item, Autoresizing::FLEXIBLE_MIN_Y)
            .unwrap();
        let deco = tree.insert_decorator(DecoratorKind::Custom(3));
        tree.set_decorator(item, deco).unwrap();
        tree.set_frame(deco, Rect::new(50.0, 60.0, 150.0, 110.0))
            .unwrap();
        assert_eq!(tree.remove_decorator(deco), Ok(item));
        assert_eq!(tree.frame(item), Some(Rect::new(50.0, 60.0, 150.0, 110.0)));
        assert_eq!(tree.autoresizing(item), Some(Autoresizing::FLEXIBLE_MIN_Y));
        assert_eq!(tree.decorator_of(item), None);
        assert_eq!(tree.decorated_of(deco), None);
    }

    #[test]
    fn removing_middle_splices_chain() {
        let (mut tree, _, item) = setup();
        let inner = tree.insert_decorator(DecoratorKind::Custom(1));
        let middle = tree.insert_decorator(DecoratorKind::TitleBar { height: 5.0 });
        let outer = tree.insert_decorator(DecoratorKind::Custom(2));
        for d in [inner, middle, outer] {
            tree.set_decorator(item, d).unwrap();
        }
        assert_eq!(tree.remove_decorator(middle), Ok(inner));
        assert_eq!(tree.decorator_chain(item).as_slice(), &[inner, outer]);
        assert_eq!(tree.decorated_of(outer), Some(inner));
        assert_eq!(tree.frame(inner), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));

        // Unwinding the rest still lands the item where the chain was.
        tree.remove_decorator(outer).unwrap();
        tree.remove_decorator(inner).unwrap();
        assert_eq!(tree.frame(item), Some(Rect::new(10.0, 20.0, 110.0, 70.0)));
    }

    #[test]
    fn removing_middle_chrome_shrinks_outer_frames() {
        let (mut tree, _, item) = setup();
        let inner = tree.insert_decorator(DecoratorKind::Custom(1));
        let bar = tree.insert_decorator(DecoratorKind::TitleBar { height: 8.0 });
        let outer = tree.insert_decorator(DecoratorKind::TitleBar { height: 4.0 });
        for d in [inner, bar, outer] {
            tree.set_decorator(item, d).unwrap();
        }
        assert_eq!(tree.frame(outer), Some(Rect::new(10.0, 20.0, 110.0, 82.0)));

        tree.remove_decorator(bar).unwrap();
        assert_eq!(tree.frame(inner), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(tree.frame(outer), Some(Rect::new(10.0, 20.0, 110.0, 74.0)));
        assert_eq!(tree.display_frame(item), tree.frame(outer));
    }

    #[test]
    fn rects_do_not_cross_non_finite_transforms() {
        let (mut tree, _, item) = setup();
        tree.set_transform(item, Affine::scale(f64::NAN)).unwrap();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(tree.convert_rect_from_enclosing(item, rect), None);
        assert_eq!(tree.convert_point_from_enclosing(item, Point::ZERO), None);
    }

    #[test]
    fn window_does_not_wrap_window() {
        let (mut tree, _, item) = setup();
        let w1 = tree.insert_decorator(DecoratorKind::Window);
        let w2 = tree.insert_decorator(DecoratorKind::Window);
        let other = tree.insert_decorator(DecoratorKind::Custom(0));
        tree.set_decorator(item, w1).unwrap();
        assert_eq!(
            tree.set_decorator(item, w2),
            Err(TreeError::DecoratorRejected {
                item,
                decorator: w2
            })
        );
        // Nothing goes outside a window either.
        assert!(tree.set_decorator(item, other).is_err());
        assert_eq!(tree.decorator_chain(item).as_slice(), &[w1]);
    }

    #[test]
    fn plain_items_are_not_decorators() {
        let (mut tree, _, item) = setup();
        let not_deco = tree.insert_item(ItemDesc::default());
        assert_eq!(
            tree.set_decorator(item, not_deco),
            Err(TreeError::NotADecorator(not_deco))
        );
        assert_eq!(
            tree.remove_decorator(item),
            Err(TreeError::NotADecorator(item))
        );
    }

    #[test]
    #[should_panic(expected = "already in use")]
    fn decorator_cannot_be_shared() {
        let (mut tree, group, item) = setup();
        let other = tree.insert_item(ItemDesc::default());
        tree.add_child(group, other).unwrap();
        let deco = tree.insert_decorator(DecoratorKind::Custom(0));
        tree.set_decorator(item, deco).unwrap();
        let _ = tree.set_decorator(other, deco);
    }

    #[test]
    fn points_cross_title_bar_and_transform() {
        let (mut tree, group, item) = setup();
        let bar = tree.insert_decorator(DecoratorKind::TitleBar { height: 10.0 });
        tree.set_decorator(item, bar).unwrap();
        // Title bar at (10, 20); content starts 10 below it.
        let p = Point::new(15.0, 35.0);
        assert_eq!(tree.convert_point_to_content(item, p), Some(Point::new(5.0, 5.0)));
        assert_eq!(
            tree.convert_point_to_ancestor(item, group, Point::new(5.0, 5.0)),
            Some(p)
        );

        assert_eq!(
            tree.convert_rect_to_content(item, Rect::new(15.0, 35.0, 25.0, 45.0)),
            Some(Rect::new(5.0, 5.0, 15.0, 15.0))
        );

        tree.set_transform(item, Affine::scale(2.0)).unwrap();
        assert_eq!(tree.convert_point_to_content(item, p), Some(Point::new(2.5, 2.5)));
        assert_eq!(
            tree.convert_rect_from_content(item, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Some(Rect::new(10.0, 30.0, 12.0, 32.0))
        );
    }

    #[test]
    fn unrelated_nodes_do_not_convert() {
        let (mut tree, _, item) = setup();
        let stranger = tree.insert_group(ItemDesc::default());
        assert_eq!(
            tree.convert_point_from_ancestor(stranger, item, Point::ORIGIN),
            None
        );
    }

    #[test]
    fn decoration_is_recorded() {
        let (mut tree, _, item) = setup();
        let _ = tree.commit();
        let deco = tree.insert_decorator(DecoratorKind::Custom(0));
        tree.set_decorator(item, deco).unwrap();
        tree.remove_decorator(deco).unwrap();
        assert_eq!(
            tree.commit().mutations,
            alloc::vec![
                Mutation::Decorated {
                    item,
                    decorator: deco
                },
                Mutation::Undecorated {
                    item,
                    decorator: deco
                },
            ]
        );
    }
}
