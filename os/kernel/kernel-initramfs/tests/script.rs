use boot_image::{Compression, ZipBuilder};
use kernel_block::NoDisks;
use kernel_initramfs::{
    BootModule, FilesystemStagingContext, InitEntrypoint, InitLaunch, Script, ScriptCommand,
    find_init_entrypoint, resolve_init,
};
use kernel_ramfs::RamFs;

const ELF: &[u8] = b"\x7FELF\x02\x01\x01\0";

#[test]
fn init_script_defers_to_its_file_directive() {
    let script = b"#!init\r\n# start the shell\r\n\r\nfile: /bin/sh\r\necho done\r\n";
    let zip = ZipBuilder::new()
        .directory("bin/")
        .file("bin/sh", ELF, Compression::Deflated)
        .file("init", script, Compression::Stored)
        .build();
    let mut heap = vec![0u8; 1024];
    let mut ctx = FilesystemStagingContext::new(&mut heap);
    ctx.stage(&[BootModule::new(&zip, None)], &mut NoDisks);

    let entrypoint = find_init_entrypoint(ctx.ramfs()).unwrap();
    assert_eq!(
        entrypoint,
        InitEntrypoint {
            script: "/init",
            target: "/bin/sh",
        }
    );
    assert_eq!(entrypoint.path(), "/bin/sh");

    let Some(InitLaunch::Script { script: body, .. }) = resolve_init(ctx.ramfs(), "/init") else {
        panic!("expected a #!init script");
    };
    let commands: Vec<_> = Script::new(body).collect();
    assert_eq!(
        commands,
        [ScriptCommand::Exec("/bin/sh"), ScriptCommand::Echo("done")]
    );
}

#[test]
fn script_without_directive_runs_itself() {
    let mut fs: RamFs = RamFs::new();
    fs.add("/etc/motd", b"#!/bin/sh\n").unwrap();
    fs.add("/boot.init", b"#!init\necho hi\nhello\n").unwrap();

    let entrypoint = find_init_entrypoint(&fs).unwrap();
    assert_eq!(entrypoint.script, "/boot.init");
    assert_eq!(entrypoint.path(), "/boot.init");

    let commands: Vec<_> = Script::new(fs.get("/boot.init").unwrap()).collect();
    assert_eq!(
        commands,
        [ScriptCommand::Echo("hi"), ScriptCommand::Exec("hello")]
    );
}

#[test]
fn first_script_in_insertion_order_wins() {
    let mut fs: RamFs = RamFs::new();
    fs.add("/b", b"#!init\nfile:/second\n").unwrap();
    fs.add("/a", b"#!init\nfile:/first\n").unwrap();
    assert_eq!(find_init_entrypoint(&fs).unwrap().script, "/b");
}

#[test]
fn no_script_no_entrypoint() {
    let mut fs: RamFs = RamFs::new();
    assert_eq!(find_init_entrypoint(&fs), None);
    fs.add("/init", ELF).unwrap();
    fs.add("/notes", b"#!initial thoughts\n").unwrap();
    assert_eq!(find_init_entrypoint(&fs), None);
}

#[test]
fn missing_init_falls_back_to_a_script() {
    let mut fs: RamFs = RamFs::new();
    fs.add("/bin/hello", ELF).unwrap();
    assert_eq!(resolve_init(&fs, "/init"), None);

    let script = b"#!init\nfile: /bin/hello\n";
    fs.add("/etc/rc.init", script).unwrap();
    assert_eq!(
        resolve_init(&fs, "/init"),
        Some(InitLaunch::Script {
            entrypoint: InitEntrypoint {
                script: "/etc/rc.init",
                target: "/bin/hello",
            },
            script,
        })
    );
}

#[test]
fn resolves_every_kind_of_init() {
    let mut fs: RamFs = RamFs::new();
    assert_eq!(resolve_init(&fs, "/init"), None);

    fs.add("/init", ELF).unwrap();
    assert_eq!(
        resolve_init(&fs, "/init"),
        Some(InitLaunch::Elf { image: ELF })
    );

    let mut fs: RamFs = RamFs::new();
    fs.add("/init", b"#!/bin/sh\necho hi\n").unwrap();
    fs.add("/bin/sh", ELF).unwrap();
    assert_eq!(
        resolve_init(&fs, "/init"),
        Some(InitLaunch::Interpreter {
            interpreter: "/bin/sh",
            image: ELF,
        })
    );

    let mut fs: RamFs = RamFs::new();
    let missing = b"#!/bin/lua\necho hi\n";
    fs.add("/init", missing).unwrap();
    assert_eq!(
        resolve_init(&fs, "/init"),
        Some(InitLaunch::CommandScript { script: missing })
    );

    let mut fs: RamFs = RamFs::new();
    let flat = b"\xEB\xFE";
    fs.add("/init", flat).unwrap();
    assert_eq!(
        resolve_init(&fs, "/init"),
        Some(InitLaunch::Raw { image: flat })
    );
}
