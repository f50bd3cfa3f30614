use std::process::ExitCode;

use mytest::{MyTestStruct, registry, sample};
use recjson::Codec;

fn main() -> ExitCode {
    println!("Hello World!");
    match run() {
        Ok(true) => {
            println!("all done");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("round trip changed the record");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> recjson::Result<bool> {
    let codec = Codec::new(registry());
    let original = sample();

    let text = codec.to_string(&original)?;
    println!("{text}");

    let json: serde_json::Value = serde_json::from_str(&text)?;
    let mut decoded = MyTestStruct::default();
    codec.deserialize_into(&json, &mut decoded)?;
    codec.try_equals(&original, &decoded)
}
