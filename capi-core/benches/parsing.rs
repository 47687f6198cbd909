//! Benchmark for header parsing and diffing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use capi_core::parser::parse_header;
use capi_core::DiffEngine;

const OLD_HEADER: &str = r#"
/**
 * @addtogroup Net
 * @{
 *
 * @brief Socket helpers.
 * @since 10
 */

/**
 * @file net_socket.h
 * @kit NetKit
 * @library libnet.so
 * @syscap SystemCapability.Communication.NetStack
 * @since 10
 */

#ifndef NET_SOCKET_H
#define NET_SOCKET_H

#ifdef __cplusplus
extern "C" {
#endif

#define NET_MAX_SOCKETS 64

/**
 * @brief Socket state.
 * @since 10
 */
typedef enum {
    NET_CLOSED = 0,
    NET_OPEN,
    NET_ERROR = 9,
} Net_State;

/**
 * @brief Socket options.
 * @since 10
 */
typedef struct {
    int timeout;
    unsigned int flags;
    union {
        int fd;
        void *handle;
    } target;
} Net_Options;

/**
 * @brief Opens a socket.
 * @param options Socket options.
 * @param state Receives the socket state.
 * @return Socket id.
 * @permission ohos.permission.INTERNET
 * @since 10
 */
int OH_Net_Open(const Net_Options *options, Net_State *state);

/**
 * @brief Closes a socket.
 * @param id Socket id.
 * @since 10
 */
void OH_Net_Close(int id);

#ifdef __cplusplus
}
#endif

#endif
/** @} */
"#;

fn new_header() -> String {
    OLD_HEADER
        .replace("int OH_Net_Open(", "long OH_Net_Open(")
        .replace("NET_ERROR = 9", "NET_ERROR = 10")
        .replace("void OH_Net_Close(int id);", "void OH_Net_Close(int id, int flags);")
}

fn bench_parse_header(c: &mut Criterion) {
    c.bench_function("parse_header", |b| {
        b.iter(|| parse_header(black_box(OLD_HEADER), "include/net_socket.h"))
    });
}

fn bench_diff_header(c: &mut Criterion) {
    let engine = DiffEngine::default();
    let new = new_header();
    c.bench_function("diff_header", |b| {
        b.iter(|| engine.diff_sources(black_box(OLD_HEADER), black_box(&new), "include/net_socket.h"))
    });
}

criterion_group!(benches, bench_parse_header, bench_diff_header);
criterion_main!(benches);
