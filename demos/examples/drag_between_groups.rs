// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving cards between two columns with drag and drop and the pickboard.
//!
//! This example drives a `trellis_tool::Context` with a scripted sequence of
//! canonical input events:
//! - hovering reports enter/exit on the columns,
//! - a press and drag moves a card from "todo" into "done",
//! - Command+C / Command+V copy a card through the active pickboard,
//! - Escape aborts a drag and puts the card back.
//!
//! Run:
//! - `cargo run -p trellis_demos --example drag_between_groups`
//! - `RUST_LOG=trellis=debug cargo run -p trellis_demos --example drag_between_groups`

use std::rc::Rc;

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use trellis_item_tree::{ColumnLayout, ItemDesc, ItemId, Tree};
use trellis_pickboard::{PickingMask, Picked};
use trellis_responder::{
    ActionCx, ActionHandler, EditCommand, Handled, Handlers, Key, KeyInput, Modifiers, StandardHandler,
};
use trellis_tool::{Context, InputEvent, InputKind, Response};

/// Column handler: reports hovering and drag feedback, edits like the
/// standard handler.
#[derive(Debug)]
struct Column {
    name: &'static str,
    standard: StandardHandler,
}

impl ActionHandler for Column {
    fn handle_enter(&self, _cx: &mut ActionCx<'_>, _item: ItemId) -> Handled {
        println!("  pointer entered {}", self.name);
        Handled::Yes
    }

    fn handle_exit(&self, _cx: &mut ActionCx<'_>, _item: ItemId) -> Handled {
        println!("  pointer left {}", self.name);
        Handled::Yes
    }

    fn handle_edit(&self, cx: &mut ActionCx<'_>, item: ItemId, command: EditCommand) -> Handled {
        self.standard.handle_edit(cx, item, command)
    }

    fn handle_drag_enter(&self, _cx: &mut ActionCx<'_>, _target: ItemId, picked: &Picked, _location: Point) {
        println!("  {} would accept {} item(s)", self.name, picked.count());
    }
}

fn name_of(tree: &Tree, item: ItemId) -> &'static str {
    tree.represented(item)
        .and_then(|object| object.downcast_ref::<&'static str>())
        .copied()
        .unwrap_or("?")
}

fn print_columns(cx: &Context, columns: &[(&str, ItemId)]) {
    for &(label, column) in columns {
        let names: Vec<&str> = cx
            .tree
            .children_of(column)
            .iter()
            .map(|&card| name_of(&cx.tree, card))
            .collect();
        println!("  {label}: {names:?}");
    }
}

fn shortcut(c: char) -> InputEvent {
    InputEvent::new(InputKind::KeyDown(
        KeyInput::new(Key::Character(c)).with_modifiers(Modifiers::META),
    ))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = Tree::new();
    let mut handlers = Handlers::new();
    let card_handler = handlers.register(Rc::new(
        StandardHandler::new().with_remove_items_at_pick_time(true),
    ));
    let todo_handler = handlers.register(Rc::new(Column {
        name: "todo",
        standard: StandardHandler::new(),
    }));
    let done_handler = handlers.register(Rc::new(Column {
        name: "done",
        standard: StandardHandler::new(),
    }));

    let board = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 420.0, 320.0)));
    let todo = tree.insert_group(ItemDesc::with_frame(Rect::new(10.0, 10.0, 200.0, 310.0)).handler(todo_handler));
    let done = tree.insert_group(ItemDesc::with_frame(Rect::new(220.0, 10.0, 410.0, 310.0)).handler(done_handler));
    for column in [todo, done] {
        tree.add_child(board, column).expect("fresh column");
        tree.set_layout(column, Box::new(ColumnLayout))
            .expect("columns are groups");
    }
    let mut cards = Vec::new();
    for (row, name) in ["plan", "write docs", "ship"].into_iter().enumerate() {
        let top = row as f64 * 50.0;
        let card = tree.insert_item(
            ItemDesc::with_frame(Rect::new(0.0, top, 190.0, top + 40.0))
                .handler(card_handler)
                .represented(Rc::new(name)),
        );
        tree.add_child(todo, card).expect("fresh card");
        cards.push(card);
    }
    let _ = tree.commit();

    let mut cx = Context::new(tree, board);
    cx.handlers = handlers;
    tracing::info!(?board, "board ready");
    let columns = [("todo", todo), ("done", done)];

    println!("== start ==");
    print_columns(&cx, &columns);

    println!("\n== hover over \"write docs\" ==");
    cx.handle_input(InputEvent::pointer_moved(Point::new(50.0, 80.0)));
    println!("  hovered: {}", cx.hovered().map_or("nothing", |id| name_of(&cx.tree, id)));

    println!("\n== drag \"write docs\" into done ==");
    let steps = [
        InputEvent::pointer_down(Point::new(50.0, 80.0)),
        InputEvent::pointer_moved(Point::new(150.0, 70.0)),
        InputEvent::pointer_moved(Point::new(300.0, 40.0)),
        InputEvent::pointer_up(Point::new(300.0, 40.0)),
    ];
    for event in steps {
        match cx.handle_input(event) {
            Response::Drag(state) => println!("  drag: {state:?}"),
            Response::Dropped(outcome) => println!("  ended: {outcome:?}"),
            _ => {}
        }
    }
    print_columns(&cx, &columns);

    println!("\n== copy \"ship\", paste into done ==");
    cx.set_first_responder(Some(cards[2]));
    cx.handle_input(shortcut('c'));
    cx.set_first_responder(Some(done));
    let pasted = cx.handle_input(shortcut('v'));
    println!("  paste handled: {}", matches!(pasted, Response::Dispatched(d) if d.is_handled()));
    print_columns(&cx, &columns);

    println!("\n== start dragging \"plan\", then press Escape ==");
    cx.handle_input(InputEvent::pointer_down(Point::new(50.0, 30.0)));
    cx.handle_input(InputEvent::pointer_moved(Point::new(300.0, 200.0)).with_picking_mask(PickingMask::DRAG_PICK));
    println!("  during the drag:");
    print_columns(&cx, &columns);
    let escape = InputEvent::new(InputKind::KeyDown(KeyInput::new(Key::Escape)));
    if let Response::Dropped(outcome) = cx.handle_input(escape) {
        println!("  ended: {outcome:?}");
    }
    cx.handle_input(InputEvent::pointer_up(Point::new(300.0, 200.0)));
    print_columns(&cx, &columns);
}
