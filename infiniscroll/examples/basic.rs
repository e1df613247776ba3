// Example: a fixed-height list that loads more rows as the window reaches its tail.
use infiniscroll::{
    Axis, Batch, DataSource, Engine, EngineOptions, FetchCompleter, Point, RenderSurface,
    ScrollDirection, Size, Slot,
};

/// Hands out 25 numbered rows per fetch, up to 100.
struct Numbers(Vec<u32>);

impl DataSource for Numbers {
    type Item = u32;

    fn item_count(&self) -> usize {
        self.0.len()
    }

    fn item_at(&self, index: usize) -> Option<&u32> {
        self.0.get(index)
    }

    fn fetch_more(&mut self, completer: FetchCompleter<u32>) {
        let start = self.0.len() as u32;
        let rows: Vec<u32> = (start..start + 25).collect();
        if start + 25 >= 100 {
            completer.complete(Batch::last(rows));
        } else {
            completer.complete(Batch::more(rows));
        }
    }

    fn append(&mut self, items: Vec<u32>) {
        self.0.extend(items);
    }
}

struct Lines;

impl RenderSurface<u32> for Lines {
    type Handle = String;

    fn create_handle(&mut self, slot: Slot, item: Option<&u32>) -> String {
        match (slot, item) {
            (Slot::Sentinel, _) => "loading...".to_string(),
            (_, Some(n)) => format!("row {n}"),
            (_, None) => String::new(),
        }
    }

    fn destroy_handle(&mut self, _handle: String) {}

    fn measure(&mut self, handle: &String, _constraint: Size) -> Size {
        Size::new(handle.len() as f64, 1.0)
    }

    fn arrange(&mut self, _handle: &mut String, _position: Point, _size: Size) {}
}

fn main() {
    let options = EngineOptions::uniform(1.0).with_initial_viewport(Some(Size::new(40.0, 10.0)));
    let mut engine = Engine::new(options, Lines, Numbers(Vec::new()));
    engine.settle(4);

    for _ in 0..12 {
        engine.page_step(Axis::Vertical, ScrollDirection::Forward);
        engine.settle(4);
        println!(
            "offset={} window={:?} items={} state={:?}",
            engine.offset().y,
            engine.window().range,
            engine.item_count(),
            engine.load_state()
        );
    }

    let visible: Vec<&String> = engine.realized().map(|(_, line)| line).collect();
    println!("realized={visible:?}");
}
