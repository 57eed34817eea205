//! `IDispatch` backend
//!
//! [`ComConnector`] resolves a program identifier to a class id and creates the object
//! out of process; [`ComObject`] drives it through `GetIDsOfNames` and `Invoke`. Calls run
//! in the multithreaded apartment, which each calling thread joins on first use.
//!
//! Collections are reached through their default member (`DISPID_VALUE`) with a 1-origin
//! index or a name, and enumerated by `length`.

use crate::{
    BindingMode, Connector, DispatchError, FromVariant, RemoteHandle, RemoteObject, Result,
    Variant, DISP_E_EXCEPTION, DISP_E_PARAMNOTFOUND,
};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};
use windows::core::{ComInterface, BSTR, GUID, HSTRING, PCWSTR};
use windows::Win32::Foundation::{VARIANT_FALSE, VARIANT_TRUE};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize, IDispatch,
    CLSCTX_INPROC_SERVER, CLSCTX_LOCAL_SERVER, COINIT_MULTITHREADED, DISPATCH_FLAGS,
    DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO,
    SAFEARRAY,
};
use windows::Win32::System::Ole::{
    SafeArrayCreateVector, SafeArrayGetDim, SafeArrayGetElement, SafeArrayGetLBound,
    SafeArrayGetUBound, SafeArrayGetVartype, SafeArrayPutElement,
};
use windows::Win32::System::Variant::{
    VariantClear, VARENUM, VARIANT, VT_ARRAY, VT_BOOL, VT_BSTR, VT_DATE, VT_DISPATCH, VT_EMPTY,
    VT_ERROR, VT_I1, VT_I2, VT_I4, VT_I8, VT_INT, VT_NULL, VT_R4, VT_R8, VT_UI1, VT_UI2,
    VT_UI4, VT_UI8, VT_UINT, VT_UNKNOWN, VT_VARIANT,
};

const DISPID_VALUE: i32 = 0;
const DISPID_PROPERTYPUT: i32 = -3;
const LOCALE_USER_DEFAULT: u32 = 0x0400;

struct Apartment {
    owned: bool,
}

impl Apartment {
    fn enter() -> Self {
        let owned = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }.is_ok();
        if !owned {
            debug!("thread already belongs to an apartment");
        }
        Self { owned }
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.owned {
            unsafe { CoUninitialize() };
        }
    }
}

thread_local! {
    static APARTMENT: Apartment = Apartment::enter();
}

fn enter_apartment() {
    // Unavailable only while the thread is being torn down
    let _ = APARTMENT.try_with(|_| ());
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn failure(err: windows::core::Error, member: &str) -> DispatchError {
    DispatchError::from_hresult(err.code().0, member, None)
}

/// Creates host objects through the class registry
#[derive(Debug, Default)]
pub struct ComConnector;

impl ComConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for ComConnector {
    fn create(&self, program_id: &str) -> Result<RemoteHandle> {
        enter_apartment();
        let create_error = |err: windows::core::Error| DispatchError::Create {
            program_id: program_id.to_string(),
            reason: format!("{:#010X}: {}", err.code().0, err.message()),
        };

        let class_id =
            unsafe { CLSIDFromProgID(&HSTRING::from(program_id)) }.map_err(create_error)?;
        let dispatch: IDispatch = unsafe {
            CoCreateInstance(&class_id, None, CLSCTX_LOCAL_SERVER | CLSCTX_INPROC_SERVER)
        }
        .map_err(create_error)?;

        debug!("created {}", program_id);
        Ok(Arc::new(ComObject::new(dispatch, program_id)))
    }
}

/// A host object reached through `IDispatch`
pub struct ComObject {
    dispatch: IDispatch,
    label: String,
    dispids: Mutex<HashMap<String, i32>>,
    methods: Mutex<HashSet<String>>,
}

// Objects are created in the multithreaded apartment, where interface pointers may be
// used from any thread
unsafe impl Send for ComObject {}
unsafe impl Sync for ComObject {}

impl ComObject {
    fn new(dispatch: IDispatch, label: impl Into<String>) -> Self {
        Self {
            dispatch,
            label: label.into(),
            dispids: Mutex::new(HashMap::new()),
            methods: Mutex::new(HashSet::new()),
        }
    }

    fn child(&self, dispatch: IDispatch, member: &str) -> RemoteHandle {
        Arc::new(ComObject::new(dispatch, format!("{}.{}", self.label, member)))
    }

    fn dispatch_id(&self, name: &str) -> Result<i32> {
        if let Some(&id) = lock(&self.dispids).get(name) {
            return Ok(id);
        }

        enter_apartment();
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut id = 0;
        unsafe {
            self.dispatch
                .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
        }
        .map_err(|e| failure(e, name))?;

        lock(&self.dispids).insert(name.to_string(), id);
        Ok(id)
    }

    fn is_method(&self, name: &str) -> bool {
        lock(&self.methods).contains(name)
    }

    fn call(&self, name: &str, flags: DISPATCH_FLAGS, args: &[Variant]) -> Result<OwnedVariant> {
        let id = self.dispatch_id(name)?;
        self.call_id(id, name, flags, args)
    }

    fn call_id(
        &self,
        id: i32,
        name: &str,
        flags: DISPATCH_FLAGS,
        args: &[Variant],
    ) -> Result<OwnedVariant> {
        enter_apartment();
        trace!("{} {} ({} args)", self.label, name, args.len());

        let put = flags == DISPATCH_PROPERTYPUT;
        // Arguments travel right to left
        let mut raw = args
            .iter()
            .rev()
            .map(|value| to_raw(value, !put))
            .collect::<Result<Vec<_>>>()?;
        let mut named = DISPID_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: raw.as_mut_ptr().cast::<VARIANT>(),
            rgdispidNamedArgs: if put { &mut named as *mut i32 } else { std::ptr::null_mut() },
            cArgs: raw.len() as u32,
            cNamedArgs: u32::from(put),
        };

        let mut result = OwnedVariant::empty();
        let mut exception = EXCEPINFO::default();
        let mut argument_error = 0u32;
        let outcome = unsafe {
            self.dispatch.Invoke(
                id,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result.0 as *mut VARIANT),
                Some(&mut exception as *mut EXCEPINFO),
                Some(&mut argument_error as *mut u32),
            )
        };

        match outcome {
            Ok(()) => Ok(result),
            Err(err) => Err(invoke_error(err.code().0, name, exception)),
        }
    }

    fn element(&self, key: Variant) -> Result<RemoteHandle> {
        let flags = DISPATCH_FLAGS(DISPATCH_METHOD.0 | DISPATCH_PROPERTYGET.0);
        let result = self.call_id(DISPID_VALUE, "Item", flags, &[key])?;
        RemoteHandle::from_variant(from_raw(self, &result.0, "Item")?)
    }
}

fn invoke_error(code: i32, member: &str, mut exception: EXCEPINFO) -> DispatchError {
    if code != DISP_E_EXCEPTION {
        return DispatchError::from_hresult(code, member, None);
    }
    if let Some(fill) = exception.pfnDeferredFillIn {
        unsafe {
            let _ = fill(&mut exception);
        }
    }

    let description = String::from_utf16_lossy(exception.bstrDescription.as_wide());
    let code = if exception.scode != 0 {
        exception.scode
    } else {
        code
    };
    DispatchError::from_hresult(code, member, Some(description).filter(|d| !d.is_empty()))
}

impl RemoteObject for ComObject {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn binding_mode(&self) -> BindingMode {
        BindingMode::Dynamic
    }

    fn get(&self, name: &str) -> Result<Variant> {
        let flags = if self.is_method(name) {
            DISPATCH_METHOD
        } else {
            DISPATCH_PROPERTYGET
        };
        let result = self.call(name, flags, &[])?;
        from_raw(self, &result.0, name)
    }

    fn set(&self, name: &str, value: Variant) -> Result<()> {
        self.call(name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
    }

    fn invoke(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        let flags = if self.is_method(name) {
            DISPATCH_METHOD
        } else {
            DISPATCH_FLAGS(DISPATCH_METHOD.0 | DISPATCH_PROPERTYGET.0)
        };
        let result = self.call(name, flags, args)?;
        from_raw(self, &result.0, name)
    }

    fn flag_as_method(&self, name: &str) -> Result<()> {
        self.dispatch_id(name)?;
        lock(&self.methods).insert(name.to_string());
        Ok(())
    }

    fn item(&self, index: i64) -> Result<RemoteHandle> {
        self.element(Variant::Int(index))
    }

    fn item_by_name(&self, name: &str) -> Result<RemoteHandle> {
        self.element(Variant::from(name))
    }

    fn elements(&self) -> Result<Vec<RemoteHandle>> {
        let count = i64::from_variant(self.get("length")?)?;
        (1..=count).map(|index| self.item(index)).collect()
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// A `VARIANT` cleared when dropped
#[repr(transparent)]
struct OwnedVariant(VARIANT);

impl OwnedVariant {
    fn empty() -> Self {
        Self(VARIANT::default())
    }

    fn tagged(vt: VARENUM) -> Self {
        let mut raw = Self::empty();
        unsafe { (*raw.0.Anonymous.Anonymous).vt = vt };
        raw
    }
}

impl Drop for OwnedVariant {
    fn drop(&mut self) {
        unsafe {
            let _ = VariantClear(&mut self.0);
        }
    }
}

/// Marshal a value; omitted arguments become "parameter not found"
fn to_raw(value: &Variant, argument: bool) -> Result<OwnedVariant> {
    let raw = match value {
        Variant::Empty if argument => {
            let mut raw = OwnedVariant::tagged(VT_ERROR);
            unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.scode = DISP_E_PARAMNOTFOUND };
            raw
        }
        Variant::Empty => OwnedVariant::empty(),
        Variant::Bool(b) => {
            let mut raw = OwnedVariant::tagged(VT_BOOL);
            let flag = if *b { VARIANT_TRUE } else { VARIANT_FALSE };
            unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.boolVal = flag };
            raw
        }
        Variant::Int(i) => match i32::try_from(*i) {
            Ok(small) => {
                let mut raw = OwnedVariant::tagged(VT_I4);
                unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.lVal = small };
                raw
            }
            Err(_) => {
                let mut raw = OwnedVariant::tagged(VT_I8);
                unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.llVal = *i };
                raw
            }
        },
        Variant::Float(x) => {
            let mut raw = OwnedVariant::tagged(VT_R8);
            unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.dblVal = *x };
            raw
        }
        Variant::Str(s) => {
            let mut raw = OwnedVariant::tagged(VT_BSTR);
            unsafe {
                (*raw.0.Anonymous.Anonymous).Anonymous.bstrVal =
                    ManuallyDrop::new(BSTR::from(s.as_str()))
            };
            raw
        }
        Variant::Array(items) => array_to_raw(items)?,
        Variant::Object(handle) => {
            let object = handle
                .as_any()
                .and_then(|any| any.downcast_ref::<ComObject>())
                .ok_or(DispatchError::TypeMismatch {
                    expected: "host object",
                    found: "foreign object",
                })?;
            let mut raw = OwnedVariant::tagged(VT_DISPATCH);
            unsafe {
                (*raw.0.Anonymous.Anonymous).Anonymous.pdispVal =
                    ManuallyDrop::new(Some(object.dispatch.clone()))
            };
            raw
        }
    };
    Ok(raw)
}

fn array_to_raw(items: &[Variant]) -> Result<OwnedVariant> {
    let array = unsafe { SafeArrayCreateVector(VT_VARIANT, 0, items.len() as u32) };
    if array.is_null() {
        return Err(DispatchError::invocation("Cannot allocate array argument"));
    }
    // The array is owned by the variant from here on, so early returns free it
    let mut raw = OwnedVariant::tagged(VARENUM(VT_ARRAY.0 | VT_VARIANT.0));
    unsafe { (*raw.0.Anonymous.Anonymous).Anonymous.parray = array };

    for (index, item) in items.iter().enumerate() {
        let element = to_raw(item, false)?;
        let index = index as i32;
        unsafe {
            SafeArrayPutElement(array, &index, (&element.0 as *const VARIANT).cast::<c_void>())
        }
        .map_err(|e| failure(e, "array element"))?;
    }
    Ok(raw)
}

/// Read a value without taking ownership of it
fn from_raw(owner: &ComObject, raw: &VARIANT, member: &str) -> Result<Variant> {
    unsafe {
        let inner = &raw.Anonymous.Anonymous;
        let data = &inner.Anonymous;
        let vt = inner.vt;

        if vt.0 & VT_ARRAY.0 != 0 {
            return array_from_raw(owner, data.parray, member);
        }

        let value = match vt {
            VT_EMPTY | VT_NULL | VT_ERROR => Variant::Empty,
            VT_BOOL => Variant::Bool(data.boolVal.0 != 0),
            VT_I1 => Variant::Int(i64::from(data.bVal as i8)),
            VT_UI1 => Variant::Int(i64::from(data.bVal)),
            VT_I2 => Variant::Int(i64::from(data.iVal)),
            VT_UI2 => Variant::Int(i64::from(data.uiVal)),
            VT_I4 | VT_INT => Variant::Int(i64::from(data.lVal)),
            VT_UI4 | VT_UINT => Variant::Int(i64::from(data.ulVal)),
            VT_I8 => Variant::Int(data.llVal),
            VT_UI8 => Variant::Int(i64::try_from(data.ullVal).map_err(|_| {
                DispatchError::TypeMismatch {
                    expected: "int",
                    found: "unsigned 64-bit value",
                }
            })?),
            VT_R4 => Variant::Float(f64::from(data.fltVal)),
            VT_R8 => Variant::Float(data.dblVal),
            VT_DATE => Variant::Float(data.date),
            VT_BSTR => Variant::Str(String::from_utf16_lossy(data.bstrVal.as_wide())),
            VT_DISPATCH => match &*data.pdispVal {
                Some(dispatch) => Variant::Object(owner.child(dispatch.clone(), member)),
                None => Variant::Empty,
            },
            VT_UNKNOWN => match &*data.punkVal {
                Some(unknown) => {
                    let dispatch: IDispatch =
                        unknown.cast().map_err(|_| DispatchError::TypeMismatch {
                            expected: "object",
                            found: "interface without dispatch",
                        })?;
                    Variant::Object(owner.child(dispatch, member))
                }
                None => Variant::Empty,
            },
            _ => {
                return Err(DispatchError::TypeMismatch {
                    expected: "automation value",
                    found: "unsupported variant type",
                })
            }
        };
        Ok(value)
    }
}

unsafe fn array_from_raw(
    owner: &ComObject,
    array: *mut SAFEARRAY,
    member: &str,
) -> Result<Variant> {
    if array.is_null() {
        return Ok(Variant::Array(Vec::new()));
    }
    if SafeArrayGetDim(array) != 1 {
        return Err(DispatchError::TypeMismatch {
            expected: "array",
            found: "multi-dimensional array",
        });
    }

    let lower = SafeArrayGetLBound(array, 1).map_err(|e| failure(e, member))?;
    let upper = SafeArrayGetUBound(array, 1).map_err(|e| failure(e, member))?;
    let element_type = SafeArrayGetVartype(array).map_err(|e| failure(e, member))?;

    let mut values = Vec::new();
    for index in lower..=upper {
        let value = match element_type {
            VT_VARIANT => {
                let mut element = OwnedVariant::empty();
                read_element(array, index, &mut element.0, member)?;
                from_raw(owner, &element.0, member)?
            }
            VT_BSTR => {
                let mut element = BSTR::new();
                read_element(array, index, &mut element, member)?;
                Variant::Str(String::from_utf16_lossy(element.as_wide()))
            }
            VT_R8 => {
                let mut element = 0f64;
                read_element(array, index, &mut element, member)?;
                Variant::Float(element)
            }
            VT_R4 => {
                let mut element = 0f32;
                read_element(array, index, &mut element, member)?;
                Variant::Float(f64::from(element))
            }
            VT_I4 | VT_INT => {
                let mut element = 0i32;
                read_element(array, index, &mut element, member)?;
                Variant::Int(i64::from(element))
            }
            VT_I2 => {
                let mut element = 0i16;
                read_element(array, index, &mut element, member)?;
                Variant::Int(i64::from(element))
            }
            VT_BOOL => {
                let mut element = 0i16;
                read_element(array, index, &mut element, member)?;
                Variant::Bool(element != 0)
            }
            VT_DISPATCH => {
                let mut element: Option<IDispatch> = None;
                read_element(array, index, &mut element, member)?;
                element
                    .map(|dispatch| Variant::Object(owner.child(dispatch, member)))
                    .unwrap_or_default()
            }
            _ => {
                return Err(DispatchError::TypeMismatch {
                    expected: "array element",
                    found: "unsupported array element type",
                })
            }
        };
        values.push(value);
    }
    Ok(Variant::Array(values))
}

/// Copy one element out of a safe array into `slot`, which takes ownership of the copy
unsafe fn read_element<T>(
    array: *mut SAFEARRAY,
    index: i32,
    slot: &mut T,
    member: &str,
) -> Result<()> {
    SafeArrayGetElement(array, &index, (slot as *mut T).cast::<c_void>())
        .map_err(|e| failure(e, member))
}
