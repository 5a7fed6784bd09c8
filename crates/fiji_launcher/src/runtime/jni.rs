//! Minimal binding of the runtime's native invocation interface
//!
//! Only the handful of functions the launcher calls are exposed. Function
//! tables are indexed by their slot in the published interface layout.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void, CStr};
use std::ptr;

pub type jint = i32;
pub type jsize = jint;
pub type jboolean = u8;
pub type jobject = *mut c_void;
pub type jclass = jobject;
pub type jstring = jobject;
pub type jobjectArray = jobject;
pub type jmethodID = *mut c_void;

pub const JNI_OK: jint = 0;
pub const JNI_ENOMEM: jint = -4;
pub const JNI_FALSE: jboolean = 0;

/// Oldest interface version that accepts the option array below
pub const JNI_VERSION_1_4: jint = 0x0001_0004;

/// Name of the exported VM creation function
pub const CREATE_VM_SYMBOL: &[u8] = b"JNI_CreateJavaVM\0";

#[repr(C)]
#[derive(Clone, Copy)]
pub union jvalue {
    pub z: jboolean,
    pub i: jint,
    pub j: i64,
    pub d: f64,
    pub l: jobject,
}

#[repr(C)]
pub struct JavaVMOption {
    pub option_string: *mut c_char,
    pub extra_info: *mut c_void,
}

#[repr(C)]
pub struct JavaVMInitArgs {
    pub version: jint,
    pub n_options: jint,
    pub options: *mut JavaVMOption,
    pub ignore_unrecognized: jboolean,
}

/// Pointer to a function table pointer, the shape of both `JNIEnv*` and
/// `JavaVM*`
pub type RawInterface = *mut *const *const c_void;

pub type CreateJavaVm =
    unsafe extern "system" fn(vm: *mut RawInterface, env: *mut RawInterface, args: *mut c_void) -> jint;

// JNIEnv function table slots
const FIND_CLASS: usize = 6;
const EXCEPTION_DESCRIBE: usize = 16;
const GET_STATIC_METHOD_ID: usize = 113;
const CALL_STATIC_OBJECT_METHOD_A: usize = 116;
const CALL_STATIC_VOID_METHOD_A: usize = 143;
const NEW_STRING_UTF: usize = 167;
const GET_STRING_UTF_CHARS: usize = 169;
const RELEASE_STRING_UTF_CHARS: usize = 170;
const NEW_OBJECT_ARRAY: usize = 172;
const SET_OBJECT_ARRAY_ELEMENT: usize = 174;

// JavaVM invoke interface slots
const DESTROY_JAVA_VM: usize = 3;
const DETACH_CURRENT_THREAD: usize = 5;

/// Fetch slot `index` of the function table behind `raw`
///
/// # Safety
/// `raw` must be a live interface pointer and `F` the slot's exact
/// function pointer type.
unsafe fn slot<F: Copy>(raw: RawInterface, index: usize) -> F {
    let table = *raw;
    let entry = *table.add(index);
    std::mem::transmute_copy::<*const c_void, F>(&entry)
}

/// Native interface of the current thread
pub struct Env {
    raw: RawInterface,
}

impl Env {
    /// # Safety
    /// `raw` must be a `JNIEnv*` attached to the calling thread.
    pub unsafe fn from_raw(raw: RawInterface) -> Self {
        Self { raw }
    }

    pub fn find_class(&self, name: &CStr) -> jclass {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, *const c_char) -> jclass =
                slot(self.raw, FIND_CLASS);
            f(self.raw, name.as_ptr())
        }
    }

    pub fn exception_describe(&self) {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface) = slot(self.raw, EXCEPTION_DESCRIBE);
            f(self.raw)
        }
    }

    pub fn get_static_method_id(&self, class: jclass, name: &CStr, signature: &CStr) -> jmethodID {
        unsafe {
            let f: unsafe extern "system" fn(
                RawInterface,
                jclass,
                *const c_char,
                *const c_char,
            ) -> jmethodID = slot(self.raw, GET_STATIC_METHOD_ID);
            f(self.raw, class, name.as_ptr(), signature.as_ptr())
        }
    }

    pub fn call_static_object_method(
        &self,
        class: jclass,
        method: jmethodID,
        args: &[jvalue],
    ) -> jobject {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, jclass, jmethodID, *const jvalue) -> jobject =
                slot(self.raw, CALL_STATIC_OBJECT_METHOD_A);
            f(self.raw, class, method, args.as_ptr())
        }
    }

    pub fn call_static_void_method(&self, class: jclass, method: jmethodID, args: &[jvalue]) {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, jclass, jmethodID, *const jvalue) =
                slot(self.raw, CALL_STATIC_VOID_METHOD_A);
            f(self.raw, class, method, args.as_ptr())
        }
    }

    pub fn new_string_utf(&self, text: &CStr) -> jstring {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, *const c_char) -> jstring =
                slot(self.raw, NEW_STRING_UTF);
            f(self.raw, text.as_ptr())
        }
    }

    /// Copy a runtime string into an owned Rust string
    pub fn get_string(&self, string: jstring) -> Option<String> {
        if string.is_null() {
            return None;
        }
        unsafe {
            let get: unsafe extern "system" fn(RawInterface, jstring, *mut jboolean) -> *const c_char =
                slot(self.raw, GET_STRING_UTF_CHARS);
            let release: unsafe extern "system" fn(RawInterface, jstring, *const c_char) =
                slot(self.raw, RELEASE_STRING_UTF_CHARS);
            let chars = get(self.raw, string, ptr::null_mut());
            if chars.is_null() {
                return None;
            }
            let value = CStr::from_ptr(chars).to_string_lossy().into_owned();
            release(self.raw, string, chars);
            Some(value)
        }
    }

    pub fn new_object_array(&self, length: jsize, class: jclass, initial: jobject) -> jobjectArray {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, jsize, jclass, jobject) -> jobjectArray =
                slot(self.raw, NEW_OBJECT_ARRAY);
            f(self.raw, length, class, initial)
        }
    }

    pub fn set_object_array_element(&self, array: jobjectArray, index: jsize, value: jobject) {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface, jobjectArray, jsize, jobject) =
                slot(self.raw, SET_OBJECT_ARRAY_ELEMENT);
            f(self.raw, array, index, value)
        }
    }
}

/// Invocation interface of a created VM
pub struct Vm {
    raw: RawInterface,
}

impl Vm {
    /// # Safety
    /// `raw` must be a `JavaVM*` returned by the creation function.
    pub unsafe fn from_raw(raw: RawInterface) -> Self {
        Self { raw }
    }

    pub fn detach_current_thread(&self) -> jint {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface) -> jint =
                slot(self.raw, DETACH_CURRENT_THREAD);
            f(self.raw)
        }
    }

    /// Blocks until every non-daemon thread of the VM has finished
    pub fn destroy(&self) -> jint {
        unsafe {
            let f: unsafe extern "system" fn(RawInterface) -> jint = slot(self.raw, DESTROY_JAVA_VM);
            f(self.raw)
        }
    }
}
