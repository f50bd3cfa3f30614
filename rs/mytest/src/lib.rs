//! Record types shared by the end-to-end scenario and the integration tests.

use std::sync::LazyLock;

use recjson::{SchemaRegistry, record, record_enum};

record_enum! {
    #[derive(Default)]
    pub enum Color {
        #[default]
        Red = 0 => "COLOR_RED",
        Green = 1 => "COLOR_GREEN",
        Blue = 2 => "COLOR_BLUE",
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct Point {
        pub x: f32,
        pub y: f32,
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct Size {
        pub width: f64,
        pub height: f64,
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct Rect {
        pub origin: Point,
        pub size: Size,
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct MyTestStruct as "myTestStruct" {
        pub center: Point,
        pub bounding: Size,
        pub color: Color,
        pub values: [f32; 5],
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct SomeTT {
        pub status: u32,
        pub flags: i8,
        pub tt_size: Size,
    }
}

record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct AnotherTestStruct {
        pub center: Point,
        pub bounding: Size,
        pub color: Color,
        pub some_tt: SomeTT,
        pub points: [Point; 4],
    }
}

/// Registers every record type of this crate, nested types included.
pub fn build_registry() -> recjson::Result<SchemaRegistry> {
    let mut builder = SchemaRegistry::builder();
    builder
        .register::<Rect>()?
        .register::<MyTestStruct>()?
        .register::<AnotherTestStruct>()?;
    builder.build()
}

static REGISTRY: LazyLock<SchemaRegistry> =
    LazyLock::new(|| build_registry().expect("built-in record schemas are consistent"));

pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

/// The value used by the `mytest` binary.
pub fn sample() -> MyTestStruct {
    MyTestStruct {
        center: Point { x: 1.0, y: 2.0 },
        bounding: Size {
            width: 3.0,
            height: 4.0,
        },
        color: Color::Green,
        values: [0.1, 0.2, 0.3, 0.4, 0.5],
    }
}
