use test_driver::run;

#[test]
fn test_0001() {
    run("0001");
}

#[test]
fn test_0002() {
    run("0002");
}

#[test]
fn test_0003() {
    run("0003");
}
